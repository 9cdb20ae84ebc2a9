//! `on_error` and `on_complete` hooks.

use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Handles the error channel. Made by `Observable::on_error`.
#[derive(Clone)]
pub struct OnError<S, F> {
  pub(crate) source: S,
  pub(crate) callback: F,
}

impl<S: ObservableType, F> ObservableType for OnError<S, F> {
  type Item = S::Item;
  type Err = Infallible;
}

pub struct OnErrorObserver<O, F> {
  observer: O,
  callback: F,
}

impl<O, F, Item, Err> Observer<Item, Err> for OnErrorObserver<O, F>
where
  O: Observer<Item, Infallible>,
  F: FnOnce(Err),
{
  fn next(&mut self, value: Item) { self.observer.next(value); }

  fn error(self, err: Err) { (self.callback)(err); }

  fn complete(self) { self.observer.complete(); }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, O> CoreObservable<O> for OnError<S, F>
where
  S: CoreObservable<OnErrorObserver<O, F>>,
  F: FnOnce(S::Err),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(OnErrorObserver { observer, callback: self.callback })
  }
}

/// Runs a callback before forwarding completion. Made by
/// `Observable::on_complete`.
#[derive(Clone)]
pub struct OnComplete<S, F> {
  pub(crate) source: S,
  pub(crate) callback: F,
}

impl<S: ObservableType, F> ObservableType for OnComplete<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct OnCompleteObserver<O, F> {
  observer: O,
  callback: F,
}

impl<O, F, Item, Err> Observer<Item, Err> for OnCompleteObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  fn next(&mut self, value: Item) { self.observer.next(value); }

  fn error(self, err: Err) { self.observer.error(err); }

  fn complete(self) {
    (self.callback)();
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, O> CoreObservable<O> for OnComplete<S, F>
where
  S: CoreObservable<OnCompleteObserver<O, F>>,
  F: FnOnce(),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(OnCompleteObserver { observer, callback: self.callback })
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn on_error_swallows_into_callback() {
    let got = Rc::new(RefCell::new(None));
    let g = got.clone();
    let mut values = vec![];
    from_iter(1..=2)
      .try_map(|v| if v < 2 { Ok(v) } else { Err(v * 100) })
      .on_error(move |e| *g.borrow_mut() = Some(e))
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![1]);
    assert_eq!(*got.borrow(), Some(200));
  }

  #[rxlite_macro::test]
  fn on_complete_runs_before_downstream_complete() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    empty::<(), ()>()
      .on_complete(move || l1.borrow_mut().push("hook"))
      .subscribe_all(|_| {}, |_| {}, move || l2.borrow_mut().push("downstream"));
    assert_eq!(*log.borrow(), vec!["hook", "downstream"]);
  }
}
