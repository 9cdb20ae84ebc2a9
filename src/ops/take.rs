use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

/// Emits the first `count` values. Made by `Observable::take`.
#[derive(Clone)]
pub struct Take<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SerialSubscription,
}

impl<S: ObservableType> ObservableType for Take<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, O> CoreObservable<O> for Take<S>
where
  S: CoreObservable<TakeObserver<O>>,
  S::Unsub: 'static,
  O: Observer<S::Item, S::Err>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SerialSubscription::default();
    if self.count == 0 {
      observer.complete();
      upstream.clone().unsubscribe();
      return upstream;
    }
    let observer =
      TakeObserver { observer: Some(observer), remaining: self.count, upstream: upstream.clone() };
    // When the source filled the quota synchronously, `upstream` is already
    // closed and cancels this subscription on arrival.
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else {
      return;
    };
    self.remaining -= 1;
    observer.next(value);
    if self.remaining == 0 {
      if let Some(observer) = self.observer.take() {
        observer.complete();
      }
      self.upstream.clone().unsubscribe();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.observer.as_ref().is_none_or(|o| o.is_closed()) || self.upstream.is_closed()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn takes_first_values_then_completes() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    from_iter::<_, Infallible>(1..=10)
      .take(3)
      .on_complete(move || l2.borrow_mut().push(0))
      .subscribe(move |v| l1.borrow_mut().push(v));
    assert_eq!(*log.borrow(), vec![1, 2, 3, 0]);
  }

  #[rxlite_macro::test]
  fn take_zero_completes_without_subscribing() {
    let subscribed = Rc::new(RefCell::new(false));
    let completed = Rc::new(RefCell::new(false));
    let (s, c) = (subscribed.clone(), completed.clone());
    defer(move || {
      *s.borrow_mut() = true;
      of::<i32, Infallible>(1)
    })
    .take(0)
    .on_complete(move || *c.borrow_mut() = true)
    .subscribe(|_| {});
    assert!(!*subscribed.borrow());
    assert!(*completed.borrow());
  }

  #[rxlite_macro::test]
  fn take_unsubscribes_async_source() {
    let scheduler = VirtualScheduler::default();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    interval::<Infallible, _>(Duration::from_millis(5), scheduler.clone())
      .take(2)
      .subscribe(move |v| s.borrow_mut().push(v));

    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*seen.borrow(), vec![0, 1]);
    assert!(scheduler.is_empty());
  }
}
