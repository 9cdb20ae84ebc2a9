use super::{BoxedSubscription, Subscription};
use crate::rc::{MutRc, RcDeref, RcDerefMut};

#[derive(Default)]
struct SerialState {
  closed: bool,
  current: Option<BoxedSubscription>,
}

/// Holds at most one subscription at a time.
///
/// `replace` swaps in a new subscription and cancels the previous one. Once
/// the serial subscription itself is unsubscribed, anything handed to
/// `replace` is cancelled on arrival. Clones share the same slot, so an
/// observer can keep a clone to reach its own upstream.
#[derive(Clone, Default)]
pub struct SerialSubscription(MutRc<SerialState>);

impl SerialSubscription {
  pub fn replace(&self, subscription: impl Subscription + 'static) {
    let mut incoming = Some(BoxedSubscription::new(subscription));
    let previous = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        None
      } else {
        std::mem::replace(&mut state.current, incoming.take())
      }
    };
    // Whichever one did not end up in the slot gets cancelled.
    if let Some(rejected) = incoming {
      rejected.unsubscribe();
    }
    if let Some(previous) = previous {
      previous.unsubscribe();
    }
  }

  /// Cancels the current subscription and leaves the slot open for the next.
  pub fn clear(&self) {
    let current = self.0.rc_deref_mut().current.take();
    if let Some(current) = current {
      current.unsubscribe();
    }
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(self) {
    let current = {
      let mut state = self.0.rc_deref_mut();
      state.closed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::subscription::ClosureSubscription;

  fn tagged(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> impl Subscription {
    let log = log.clone();
    ClosureSubscription(move || log.borrow_mut().push(tag))
  }

  #[rxlite_macro::test]
  fn replace_cancels_previous() {
    let log = Rc::new(RefCell::new(vec![]));
    let serial = SerialSubscription::default();
    serial.replace(tagged(&log, "a"));
    serial.replace(tagged(&log, "b"));
    assert_eq!(*log.borrow(), vec!["a"]);

    serial.clone().unsubscribe();
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert!(serial.is_closed());
  }

  #[rxlite_macro::test]
  fn replace_after_close_cancels_immediately() {
    let log = Rc::new(RefCell::new(vec![]));
    let serial = SerialSubscription::default();
    serial.clone().unsubscribe();
    serial.replace(tagged(&log, "late"));
    assert_eq!(*log.borrow(), vec!["late"]);
  }

  #[rxlite_macro::test]
  fn clear_keeps_slot_open() {
    let log = Rc::new(RefCell::new(vec![]));
    let serial = SerialSubscription::default();
    serial.replace(tagged(&log, "a"));
    serial.clear();
    assert_eq!(*log.borrow(), vec!["a"]);
    assert!(!serial.is_closed());

    serial.replace(tagged(&log, "b"));
    assert_eq!(*log.borrow(), vec!["a"]);
  }
}
