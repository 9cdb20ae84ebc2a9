use super::Subscription;

/// Object-safe mirror of [`Subscription`]; `unsubscribe(self)` needs `Sized`.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased subscription.
///
/// Operators that juggle subscriptions of different upstream types (the
/// inner streams of `merge_map`, the replacement stream of `catch_error`)
/// store them as `BoxedSubscription`. The boxed value is `'static`: a
/// subscription is a control handle that may be cancelled at any later time,
/// so it cannot borrow anything.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let subs = vec![BoxedSubscription::new(()), BoxedSubscription::new(())];
/// for sub in subs {
///   sub.unsubscribe();
/// }
/// ```
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner>);

impl BoxedSubscription {
  #[inline]
  pub fn new(subscription: impl Subscription + 'static) -> Self { Self(Box::new(subscription)) }
}

/// Conversion into a [`BoxedSubscription`], available on every `'static`
/// subscription.
pub trait IntoBoxedSubscription {
  fn into_boxed(self) -> BoxedSubscription;
}

impl<T: Subscription + 'static> IntoBoxedSubscription for T {
  #[inline]
  fn into_boxed(self) -> BoxedSubscription { BoxedSubscription::new(self) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;
  use crate::subscription::ClosureSubscription;

  #[rxlite_macro::test]
  fn boxed_forwards_unsubscribe() {
    let hits = Rc::new(Cell::new(0));
    let c_hits = hits.clone();
    let boxed = ClosureSubscription(move || c_hits.set(c_hits.get() + 1)).into_boxed();

    assert!(!boxed.is_closed());
    boxed.unsubscribe();
    assert_eq!(hits.get(), 1);
  }

  #[rxlite_macro::test]
  fn boxed_unit_is_closed() {
    let boxed = BoxedSubscription::new(());
    assert!(boxed.is_closed());
    boxed.unsubscribe();
  }
}
