use crate::observable::{CoreObservable, ObservableType};

/// Observable whose source is built at subscribe time. See [`defer`].
#[derive(Clone)]
pub struct Defer<F> {
  factory: F,
}

/// Calls `factory` on every subscription and subscribes to the observable it
/// returns.
pub fn defer<F, R>(factory: F) -> Defer<F>
where
  F: FnOnce() -> R,
  R: ObservableType,
{
  Defer { factory }
}

impl<F, R> ObservableType for Defer<F>
where
  F: FnOnce() -> R,
  R: ObservableType,
{
  type Item = R::Item;
  type Err = R::Err;
}

impl<F, R, O> CoreObservable<O> for Defer<F>
where
  F: FnOnce() -> R,
  R: CoreObservable<O>,
{
  type Unsub = R::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { (self.factory)().actual_subscribe(observer) }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn factory_runs_per_subscription() {
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let source = defer(move || {
      c.set(c.get() + 1);
      of::<_, Infallible>(c.get())
    });
    assert_eq!(calls.get(), 0);

    let mut seen = vec![];
    source.clone().subscribe(|v| seen.push(v));
    source.subscribe(|v| seen.push(v));
    assert_eq!(seen, vec![1, 2]);
  }
}
