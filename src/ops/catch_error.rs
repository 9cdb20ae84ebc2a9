//! `catch_error`
//!
//! On error, asks a selector for a replacement observable and continues the
//! output with it. The selector also receives a [`Caught`] handle: an
//! observable that subscribes the source again with the same `catch_error`
//! attached, so `|_, caught| caught` restarts the whole stream on every error.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let attempts = Rc::new(Cell::new(0));
//! let a = attempts.clone();
//! let total = Rc::new(Cell::new(0));
//! let t = total.clone();
//! create(move |emitter: &mut dyn Emitter<i32, &'static str>| {
//!   a.set(a.get() + 1);
//!   if a.get() < 3 {
//!     emitter.error("not yet");
//!   } else {
//!     emitter.next(a.get());
//!     emitter.complete();
//!   }
//! })
//! .catch_error(|_, caught| caught)
//! .on_error(|_| {})
//! .subscribe(move |v| t.set(t.get() + v));
//!
//! assert_eq!(attempts.get(), 3);
//! assert_eq!(total.get(), 3);
//! ```

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use log::debug;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer},
  subscription::{SerialSubscription, Subscription},
};

/// Made by `Observable::catch_error`.
#[derive(Clone)]
pub struct CatchError<S, F> {
  pub(crate) source: S,
  pub(crate) selector: F,
}

/// The source of a `catch_error`, ready to be subscribed again.
///
/// Handed to the selector next to the error, to be returned as the
/// replacement stream. Each subscription of a `Caught` is a fresh
/// subscription of the original source, still guarded by the same selector
/// and cancelled by the same subscription handle.
pub struct Caught<Item, Err> {
  resubscribe: Rc<dyn Fn(BoxedObserver<Item, Err>) -> SerialSubscription>,
}

impl<Item, Err> Clone for Caught<Item, Err> {
  fn clone(&self) -> Self { Caught { resubscribe: self.resubscribe.clone() } }
}

impl<Item, Err> ObservableType for Caught<Item, Err> {
  type Item = Item;
  type Err = Err;
}

// Only the boxed observer `catch_error` hands to its replacement, so
// restarting the source never wraps it a second time.
impl<Item, Err> CoreObservable<BoxedObserver<Item, Err>> for Caught<Item, Err> {
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: BoxedObserver<Item, Err>) -> Self::Unsub {
    (self.resubscribe)(observer)
  }
}

impl<S, F, R> ObservableType for CatchError<S, F>
where
  S: ObservableType,
  F: FnMut(S::Err, Caught<S::Item, S::Err>) -> R,
  R: ObservableType<Item = S::Item, Err = S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;
}

/// State shared by every subscription of the source made through one
/// `catch_error` subscription.
pub struct CatchShared<S, F, Item, Err> {
  source: S,
  selector: RefCell<F>,
  // The live source or replacement; each recovery swaps its stream in here.
  serial: SerialSubscription,
  // Bumped whenever a stream starts, so a subscribe call that returns after
  // a newer stream took over knows its result is stale.
  epoch: Cell<usize>,
  // A fn pointer keeps `CatchObserver` free of the bounds needed to
  // subscribe the source again.
  subscribe_fn: fn(&Rc<Self>, BoxedObserver<Item, Err>),
}

impl<S, F, Item, Err> CatchShared<S, F, Item, Err> {
  fn start(&self) -> usize {
    let epoch = self.epoch.get() + 1;
    self.epoch.set(epoch);
    epoch
  }

  fn is_current(&self, epoch: usize) -> bool { self.epoch.get() == epoch }
}

fn subscribe_caught<S, F, Item, Err>(
  shared: &Rc<CatchShared<S, F, Item, Err>>, observer: BoxedObserver<Item, Err>,
) where
  S: CoreObservable<CatchObserver<S, F, Item, Err>> + Clone,
  S::Unsub: 'static,
{
  let epoch = shared.start();
  let catch_observer = CatchObserver { observer, shared: shared.clone() };
  let unsub = shared.source.clone().actual_subscribe(catch_observer);
  if shared.is_current(epoch) {
    shared.serial.replace(unsub);
  } else {
    // Failed and recovered before the subscribe call returned.
    unsub.unsubscribe();
  }
}

pub struct CatchObserver<S, F, Item, Err> {
  observer: BoxedObserver<Item, Err>,
  shared: Rc<CatchShared<S, F, Item, Err>>,
}

impl<S, F, R, Item, Err> Observer<Item, Err> for CatchObserver<S, F, Item, Err>
where
  S: 'static,
  F: FnMut(Err, Caught<Item, Err>) -> R + 'static,
  R: CoreObservable<BoxedObserver<Item, Err>>,
  R::Unsub: 'static,
  Item: 'static,
  Err: 'static,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    let shared = self.shared;
    if shared.serial.is_closed() || self.observer.is_closed() {
      return;
    }
    // The errored source is done; release it before the replacement starts.
    shared.serial.clear();

    let resubscribe = shared.clone();
    let caught = Caught {
      resubscribe: Rc::new(move |observer: BoxedObserver<Item, Err>| {
        (resubscribe.subscribe_fn)(&resubscribe, observer);
        resubscribe.serial.clone()
      }),
    };
    let replacement = {
      let mut selector = shared.selector.borrow_mut();
      (*selector)(err, caught)
    };
    debug!("catch_error: recovered from an error, subscribing the replacement stream");
    let epoch = shared.start();
    let unsub = replacement.actual_subscribe(self.observer);
    // A replacement that restarted the source has already put that stream
    // in the slot, and `unsub` is the slot itself.
    if shared.is_current(epoch) {
      shared.serial.replace(unsub);
    }
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.shared.serial.is_closed() || self.observer.is_closed() }
}

impl<S, F, R, O, Item, Err> CoreObservable<O> for CatchError<S, F>
where
  S: ObservableType<Item = Item, Err = Err>,
  S: CoreObservable<CatchObserver<S, F, Item, Err>> + Clone + 'static,
  S::Unsub: 'static,
  F: FnMut(Err, Caught<Item, Err>) -> R + 'static,
  R: ObservableType<Item = Item, Err = Err>,
  R: CoreObservable<BoxedObserver<Item, Err>>,
  R::Unsub: 'static,
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = Rc::new(CatchShared {
      source: self.source,
      selector: RefCell::new(self.selector),
      serial: SerialSubscription::default(),
      epoch: Cell::new(0),
      subscribe_fn: subscribe_caught::<S, F, Item, Err>,
    });
    subscribe_caught::<S, F, Item, Err>(&shared, Box::new(observer));
    shared.serial.clone()
  }
}
