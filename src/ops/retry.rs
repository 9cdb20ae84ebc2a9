//! `retry`
//!
//! Resubscribes to the source when it errors, for as long as a
//! [`RetryPolicy`] allows. Every attempt is a fresh subscription; nothing
//! carries over from the attempt that failed.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let attempts = Rc::new(Cell::new(0));
//! let a = attempts.clone();
//! let failed = Rc::new(Cell::new(false));
//! let f = failed.clone();
//! create(move |emitter: &mut dyn Emitter<(), &'static str>| {
//!   a.set(a.get() + 1);
//!   emitter.error("unavailable");
//! })
//! .retry(2)
//! .on_error(move |_| f.set(true))
//! .subscribe(|_| {});
//!
//! // One initial attempt plus two retries.
//! assert_eq!(attempts.get(), 3);
//! assert!(failed.get());
//! ```

use std::{cell::Cell, rc::Rc};

use log::debug;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

/// Decides whether an error should be retried.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// #[derive(Clone)]
/// struct ServerErrors;
///
/// impl RetryPolicy<u16> for ServerErrors {
///   fn should_retry(&self, status: &u16, attempt: usize) -> bool {
///     attempt < 3 && (500..600).contains(status)
///   }
/// }
/// ```
pub trait RetryPolicy<Err>: Clone {
  /// `attempt` counts the retries already made for this subscription, so it
  /// is 0 on the first error.
  fn should_retry(&self, err: &Err, attempt: usize) -> bool;

  /// Reset the attempt counter whenever the source emits a value.
  fn reset_on_success(&self) -> bool { false }
}

impl<Err> RetryPolicy<Err> for usize {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool { attempt < *self }
}

/// Builder for a count based retry policy.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let config = RetryConfig::new().count(5).reset_on_success();
/// ```
#[derive(Clone, Default)]
pub struct RetryConfig {
  count: Option<usize>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Retries forever until configured otherwise.
  pub fn new() -> Self { Self::default() }

  /// At most `count` retries, so at most `count + 1` subscriptions.
  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  /// Start counting again after every value. A source that keeps making
  /// progress between failures is then retried indefinitely.
  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool {
    self.count.is_none_or(|count| attempt < count)
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

/// Made by `Observable::retry`.
#[derive(Clone)]
pub struct Retry<S, P> {
  pub(crate) source: S,
  pub(crate) policy: P,
}

impl<S: ObservableType, P> ObservableType for Retry<S, P> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct RetryObserver<S, P, O> {
  source: S,
  policy: P,
  observer: O,
  attempts: usize,
  serial: SerialSubscription,
  // Bumped on every subscription of the source; a subscription that returns
  // after a newer one started is already finished.
  epoch: Rc<Cell<usize>>,
  subscribe_fn: fn(Self),
}

impl<S, P, O> RetryObserver<S, P, O>
where
  S: CoreObservable<Self> + Clone,
  S::Unsub: 'static,
{
  fn subscribe_source(self) {
    let serial = self.serial.clone();
    let epoch = self.epoch.clone();
    let current = epoch.get() + 1;
    epoch.set(current);

    let unsub = self.source.clone().actual_subscribe(self);
    if epoch.get() == current {
      serial.replace(unsub);
    } else {
      unsub.unsubscribe();
    }
  }
}

impl<S, P, O, Item, Err> Observer<Item, Err> for RetryObserver<S, P, O>
where
  P: RetryPolicy<Err>,
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.attempts > 0 && self.policy.reset_on_success() {
      self.attempts = 0;
    }
    self.observer.next(value);
  }

  fn error(mut self, err: Err) {
    if self.serial.is_closed() {
      return;
    }
    if self.policy.should_retry(&err, self.attempts) {
      self.attempts += 1;
      debug!("retry: resubscribing to the source, attempt {}", self.attempts);
      (self.subscribe_fn)(self);
    } else {
      self.observer.error(err);
    }
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.serial.is_closed() || self.observer.is_closed() }
}

impl<S, P, O, Item, Err> CoreObservable<O> for Retry<S, P>
where
  S: ObservableType<Item = Item, Err = Err>,
  S: CoreObservable<RetryObserver<S, P, O>> + Clone,
  S::Unsub: 'static,
  P: RetryPolicy<Err>,
  O: Observer<Item, Err>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let serial = SerialSubscription::default();
    RetryObserver {
      source: self.source,
      policy: self.policy,
      observer,
      attempts: 0,
      serial: serial.clone(),
      epoch: Rc::new(Cell::new(0)),
      subscribe_fn: RetryObserver::subscribe_source,
    }
    .subscribe_source();
    serial
  }
}
