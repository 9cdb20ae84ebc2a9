//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::convert::Infallible;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. `error` and `complete` take `self` by value: once a
/// terminal signal is delivered there is no observer left to deliver anything
/// else to.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(self, err: Err);

  /// Handle completion of the observable
  fn complete(self);

  /// Checks if the observer is closed.
  ///
  /// Synchronous sources (like `from_iter`) poll this to stop emitting
  /// early, e.g. after a downstream `take` is satisfied.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// A trait for emitting items to an Observer via mutable reference.
///
/// `create` hands its closure a `&mut dyn Emitter` so the concrete observer
/// type of the downstream chain never leaks into the closure's signature.
/// Unlike `Observer`, all methods take `&mut self`; terminal methods close the
/// emitter and later calls are ignored.
pub trait Emitter<Item, Err> {
  fn next(&mut self, value: Item);
  fn error(&mut self, err: Err);
  fn complete(&mut self);
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (`Box<dyn DynObserver>`)
///
/// Standard Observer trait is not object-safe because terminal methods take
/// `self` by value. DynObserver mirrors the interface but adapts it for
/// vtables.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err); }
  fn box_complete(self: Box<Self>) { (*self).complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed observer. Used wherever a chain has to be type-erased, such as the
/// downstream of `catch_error` or the subscribers of a `Subject`.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err>>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Observer made from a `next` closure.
///
/// Only streams that cannot fail (`Err = Infallible`) may be subscribed this
/// way, so an error can never reach an observer with no error handler.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  fn error(self, err: Infallible) { match err {} }

  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer made from three closures, used by `subscribe_all`.
#[derive(Clone)]
pub struct AllObserver<N, E, C> {
  pub next: N,
  pub error: E,
  pub complete: C,
}

impl<Item, Err, N, E, C> Observer<Item, Err> for AllObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  fn error(self, err: Err) { (self.error)(err); }

  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(|o| o.is_closed()) }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(self, _: ()) {}

    fn complete(self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[rxlite_macro::test]
  fn observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_closed());
  }

  #[rxlite_macro::test]
  fn closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = FnMutObserver(|v: i32| {
      count += v;
    });

    closure_obs.next(10);
    closure_obs.next(20);
    assert_eq!(count, 30);
  }

  #[rxlite_macro::test]
  fn boxed_observer_forwards_terminal() {
    let done = Rc::new(RefCell::new(None));
    let done_c = done.clone();
    let mut boxed: BoxedObserver<i32, &'static str> = Box::new(AllObserver {
      next: |_: i32| {},
      error: move |e: &'static str| *done_c.borrow_mut() = Some(e),
      complete: || {},
    });
    boxed.next(1);
    boxed.error("boom");
    assert_eq!(*done.borrow(), Some("boom"));
  }

  #[rxlite_macro::test]
  fn none_observer_is_closed() {
    let none: Option<TestObserver> = None;
    assert!(none.is_closed());
  }
}
