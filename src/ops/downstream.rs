//! The downstream end of operators fed by more than one upstream.
//!
//! `merge_map` and `switch_map` deliver from several inner streams into one
//! observer. When that observer feeds a signal back into a sibling stream
//! (through a `Subject`, say), the sibling reaches the observer while it is
//! still busy. Such signals are queued and delivered in order once the
//! running call returns.

use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
};

use log::trace;

use crate::observer::Observer;

enum Signal<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

pub(crate) struct Downstream<O, Item, Err> {
  observer: RefCell<Option<O>>,
  queued: RefCell<VecDeque<Signal<Item, Err>>>,
  // Last known `is_closed` of the observer, answered while it is busy.
  closed: Cell<bool>,
}

impl<O, Item, Err> Downstream<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  pub(crate) fn new(observer: O) -> Self {
    Downstream {
      observer: RefCell::new(Some(observer)),
      queued: RefCell::new(VecDeque::new()),
      closed: Cell::new(false),
    }
  }

  pub(crate) fn next(&self, value: Item) { self.deliver(Signal::Next(value)) }

  pub(crate) fn error(&self, err: Err) { self.deliver(Signal::Error(err)) }

  pub(crate) fn complete(&self) { self.deliver(Signal::Complete) }

  pub(crate) fn is_closed(&self) -> bool {
    match self.observer.try_borrow() {
      Ok(observer) => observer.as_ref().is_none_or(|o| o.is_closed()),
      Err(_) => self.closed.get(),
    }
  }

  fn deliver(&self, signal: Signal<Item, Err>) {
    let Ok(mut slot) = self.observer.try_borrow_mut() else {
      trace!("downstream busy, queueing signal");
      self.queued.borrow_mut().push_back(signal);
      return;
    };
    let mut signal = Some(signal);
    while let Some(current) = signal {
      match current {
        Signal::Next(value) => {
          if let Some(observer) = slot.as_mut() {
            observer.next(value);
          }
        }
        Signal::Error(err) => {
          if let Some(observer) = slot.take() {
            observer.error(err);
          }
        }
        Signal::Complete => {
          if let Some(observer) = slot.take() {
            observer.complete();
          }
        }
      }
      self.closed.set(slot.as_ref().is_none_or(|o| o.is_closed()));
      signal = self.queued.borrow_mut().pop_front();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::observer::AllObserver;

  #[rxlite_macro::test]
  fn signals_after_a_terminal_are_ignored() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let downstream = Downstream::new(AllObserver {
      next: move |v: i32| l1.borrow_mut().push(v),
      error: |_: ()| panic!("no error expected"),
      complete: move || l2.borrow_mut().push(0),
    });

    downstream.next(1);
    downstream.complete();
    downstream.next(2);
    downstream.error(());
    assert_eq!(*log.borrow(), vec![1, 0]);
    assert!(downstream.is_closed());
  }
}
