//! Shared mutable state for a single subscription.
//!
//! Every operator that needs state shared between its outer and inner
//! observers keeps it in a [`MutRc`]. Borrows are kept short: nothing in this
//! crate holds a borrow while calling into another observer or subscription.

use std::{
  cell::{Ref, RefCell, RefMut},
  rc::Rc,
};

pub trait RcDeref {
  type Target;
  fn rc_deref(&self) -> Ref<'_, Self::Target>;
}

pub trait RcDerefMut: RcDeref {
  fn rc_deref_mut(&self) -> RefMut<'_, Self::Target>;
}

/// `Rc<RefCell<T>>` with a shorter name and borrow helpers.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }
}

impl<T> RcDeref for MutRc<T> {
  type Target = T;

  #[inline]
  fn rc_deref(&self) -> Ref<'_, T> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  #[inline]
  fn rc_deref_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxlite_macro::test]
  fn clones_share_the_value() {
    let counter = MutRc::own(0);
    let other = counter.clone();
    *other.rc_deref_mut() += 2;
    assert_eq!(*counter.rc_deref(), 2);
  }

  #[rxlite_macro::test]
  fn default_wraps_default_value() {
    let empty: MutRc<Vec<i32>> = MutRc::default();
    assert!(empty.rc_deref().is_empty());
  }
}
