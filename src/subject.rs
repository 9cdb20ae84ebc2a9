//! A multicast handle that is both an Observer and an Observable.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer},
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::Subscription,
};

struct SubjectEntry<Item, Err> {
  closed: Cell<bool>,
  observer: RefCell<Option<BoxedObserver<Item, Err>>>,
}

enum Terminal<Err> {
  Completed,
  Errored(Err),
}

struct SubjectState<Item, Err> {
  observers: Vec<Rc<SubjectEntry<Item, Err>>>,
  terminal: Option<Terminal<Err>>,
}

/// Forwards every signal it receives to all current subscribers.
///
/// `Subject` is a cheap handle: clones feed the same subscriber list. Once a
/// subject has completed or errored, later subscribers receive that terminal
/// signal straight away.
///
/// ```rust
/// use std::{cell::RefCell, convert::Infallible, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let mut subject = Subject::<i32, Infallible>::default();
/// let seen = Rc::new(RefCell::new(vec![]));
/// let seen_c = seen.clone();
/// subject.clone().subscribe(move |v| seen_c.borrow_mut().push(v));
///
/// subject.next(1);
/// subject.next(2);
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Subject<Item, Err>(MutRc<SubjectState<Item, Err>>);

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Subject(MutRc::own(SubjectState { observers: vec![], terminal: None })) }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item, Err> Subject<Item, Err> {
  /// Number of live subscribers.
  pub fn observer_count(&self) -> usize { self.0.rc_deref().observers.len() }

  fn take_observers(&self, terminal: Terminal<Err>) -> Option<Vec<Rc<SubjectEntry<Item, Err>>>> {
    let mut state = self.0.rc_deref_mut();
    if state.terminal.is_some() {
      return None;
    }
    state.terminal = Some(terminal);
    Some(std::mem::take(&mut state.observers))
  }
}

impl<Item, Err> ObservableType for Subject<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  fn next(&mut self, value: Item) {
    let observers = {
      let state = self.0.rc_deref();
      if state.terminal.is_some() {
        return;
      }
      state.observers.clone()
    };
    for entry in observers.iter().filter(|e| !e.closed.get()) {
      // A subscriber re-entering its own delivery is skipped.
      if let Ok(mut slot) = entry.observer.try_borrow_mut() {
        if let Some(observer) = slot.as_mut() {
          observer.next(value.clone());
        }
      }
    }
  }

  fn error(self, err: Err) {
    let Some(observers) = self.take_observers(Terminal::Errored(err.clone())) else {
      return;
    };
    for entry in observers {
      entry.closed.set(true);
      let observer = entry.observer.borrow_mut().take();
      if let Some(observer) = observer {
        observer.error(err.clone());
      }
    }
  }

  fn complete(self) {
    let Some(observers) = self.take_observers(Terminal::Completed) else {
      return;
    };
    for entry in observers {
      entry.closed.set(true);
      let observer = entry.observer.borrow_mut().take();
      if let Some(observer) = observer {
        observer.complete();
      }
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().terminal.is_some() }
}

impl<Item, Err, O> CoreObservable<O> for Subject<Item, Err>
where
  Item: 'static,
  Err: Clone + 'static,
  O: Observer<Item, Err> + 'static,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let finished = match &self.0.rc_deref().terminal {
      None => None,
      Some(Terminal::Completed) => Some(None),
      Some(Terminal::Errored(err)) => Some(Some(err.clone())),
    };
    let entry = Rc::new(SubjectEntry { closed: Cell::new(false), observer: RefCell::new(None) });
    match finished {
      None => {
        *entry.observer.borrow_mut() = Some(Box::new(observer));
        self.0.rc_deref_mut().observers.push(entry.clone());
      }
      Some(err) => {
        entry.closed.set(true);
        match err {
          Some(err) => observer.error(err),
          None => observer.complete(),
        }
      }
    }
    SubjectSubscription { subject: self.0, entry }
  }
}

/// Removes one subscriber from its subject.
pub struct SubjectSubscription<Item, Err> {
  subject: MutRc<SubjectState<Item, Err>>,
  entry: Rc<SubjectEntry<Item, Err>>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    self.entry.closed.set(true);
    self
      .subject
      .rc_deref_mut()
      .observers
      .retain(|e| !Rc::ptr_eq(e, &self.entry));
    // Dropped outside any borrow of the subject. While the entry is busy
    // delivering, the observer stays put: the entry is closed, so `next`
    // skips it, and the observer goes when the last handle to the entry does.
    let observer = self.entry.observer.try_borrow_mut().ok().and_then(|mut o| o.take());
    drop(observer);
  }

  fn is_closed(&self) -> bool { self.entry.closed.get() }
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use super::*;
  use crate::prelude::*;

  #[rxlite_macro::test]
  fn multicasts_to_all_subscribers() {
    let mut subject = Subject::<i32, Infallible>::default();
    let a = Rc::new(RefCell::new(vec![]));
    let b = Rc::new(RefCell::new(vec![]));
    let (ac, bc) = (a.clone(), b.clone());
    subject.clone().subscribe(move |v| ac.borrow_mut().push(v));
    subject.next(1);
    subject.clone().subscribe(move |v| bc.borrow_mut().push(v));
    subject.next(2);

    assert_eq!(*a.borrow(), vec![1, 2]);
    assert_eq!(*b.borrow(), vec![2]);
  }

  #[rxlite_macro::test]
  fn unsubscribe_removes_subscriber() {
    let mut subject = Subject::<i32, Infallible>::default();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    let subscription = subject
      .clone()
      .subscribe(move |v| s.borrow_mut().push(v));
    subject.next(1);
    subscription.unsubscribe();
    subject.next(2);

    assert_eq!(*seen.borrow(), vec![1]);
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxlite_macro::test]
  fn late_subscriber_gets_terminal() {
    let subject = Subject::<i32, &'static str>::default();
    subject.clone().error("gone");

    let got = Rc::new(RefCell::new(None));
    let g = got.clone();
    let subscription = subject.subscribe_all(|_| {}, move |e| *g.borrow_mut() = Some(e), || {});
    assert_eq!(*got.borrow(), Some("gone"));
    assert!(subscription.is_closed());
  }

  #[rxlite_macro::test]
  fn unsubscribe_during_own_delivery() {
    let mut subject = Subject::<i32, Infallible>::default();
    let seen = Rc::new(RefCell::new(vec![]));
    let handle = Rc::new(RefCell::new(None::<SubjectSubscription<i32, Infallible>>));
    let (s, h) = (seen.clone(), handle.clone());
    let subscription = subject.clone().subscribe(move |v| {
      s.borrow_mut().push(v);
      let own = h.borrow_mut().take();
      if let Some(own) = own {
        own.unsubscribe();
      }
    });
    *handle.borrow_mut() = Some(subscription);

    subject.next(1);
    subject.next(2);
    assert_eq!(*seen.borrow(), vec![1]);
    assert_eq!(subject.observer_count(), 0);
  }
}
