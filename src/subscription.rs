//! Subscription handles.
//!
//! A subscription is the live link between an observable and its observer.
//! `unsubscribe` consumes the handle; handles that are shared between several
//! owners (such as [`SerialSubscription`]) make repeated calls a no-op.

mod boxed;
mod dynamic;
mod serial;

pub use boxed::*;
pub use dynamic::*;
pub use serial::*;

/// A handle to cancel an active subscription.
pub trait Subscription {
  /// Stop receiving signals and release every resource owned by the
  /// subscription, upstream and inner subscriptions included.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }
}

/// The unit subscription owns nothing and is always closed.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<U: Subscription> Subscription for Option<U> {
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(U::is_closed) }
}

/// Runs a teardown closure on unsubscribe.
pub struct ClosureSubscription<F: FnOnce()>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  fn unsubscribe(self) { (self.0)() }

  fn is_closed(&self) -> bool { false }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Consumes the guard without unsubscribing.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;

  #[rxlite_macro::test]
  fn guard_unsubscribes_on_drop() {
    let torn_down = Rc::new(Cell::new(false));
    let flag = torn_down.clone();
    {
      let _guard = ClosureSubscription(move || flag.set(true)).unsubscribe_when_dropped();
      assert!(!torn_down.get());
    }
    assert!(torn_down.get());
  }

  #[rxlite_macro::test]
  fn guard_into_inner_keeps_subscription_alive() {
    let torn_down = Rc::new(Cell::new(false));
    let flag = torn_down.clone();
    let guard = SubscriptionGuard::new(ClosureSubscription(move || flag.set(true)));
    let inner = guard.into_inner();
    assert!(!torn_down.get());
    inner.unsubscribe();
    assert!(torn_down.get());
  }

  #[rxlite_macro::test]
  fn unit_subscription_is_closed() {
    assert!(().is_closed());
    ().unsubscribe();
  }
}
