//! Observables: lazy descriptions of values produced over time.
//!
//! An observable does nothing until it is subscribed. Subscribing consumes the
//! observable value; to subscribe several times, clone it first. Every source
//! and operator in this crate is `Clone` when its parts are, and every
//! subscription builds its own state from scratch.
//!
//! The trait stack:
//!
//! - [`ObservableType`] names the `Item` and `Err` types of a stream.
//! - [`CoreObservable<O>`] is implemented by each source and operator for
//!   every observer type `O` it can drive.
//! - [`Observable`] is the user-facing extension trait carrying the operator
//!   methods and the `subscribe` family. It is implemented for every
//!   `ObservableType`.

use std::convert::Infallible;

use crate::{
  observer::{AllObserver, FnMutObserver},
  ops::{
    catch_error::{CatchError, Caught},
    finalize::Finalize,
    lifecycle::{OnComplete, OnError},
    map::{Map, MapWithIndex, TryMap},
    merge_map::{MergeMap, MergeMapConfig},
    retry::{Retry, RetryPolicy},
    switch_map::SwitchMap,
    take::Take,
  },
  subscription::Subscription,
};

mod boxed;
mod create;
mod defer;
mod of;
mod timer;
mod trivial;

pub use boxed::*;
pub use create::*;
pub use defer::*;
pub use of::*;
pub use timer::*;
pub use trivial::*;

/// Names the value and error types of a stream.
pub trait ObservableType {
  type Item;
  type Err;
}

/// The subscribe logic of a source or operator, for one observer type.
pub trait CoreObservable<O>: ObservableType {
  type Unsub: Subscription;

  /// Start producing values into `observer`.
  ///
  /// Use the [`Observable`] methods instead of calling this directly.
  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Operators and subscribe methods available on every observable.
pub trait Observable: ObservableType + Sized {
  /// Subscribe with a `next` closure.
  ///
  /// Only streams that cannot fail may be subscribed this way. Handle the
  /// error channel first with [`Observable::on_error`], or use
  /// [`Observable::subscribe_all`].
  ///
  /// ```rust
  /// use rxlite::prelude::*;
  ///
  /// let mut seen = vec![];
  /// from_iter::<_, std::convert::Infallible>(1..=3).subscribe(|v| seen.push(v));
  /// assert_eq!(seen, vec![1, 2, 3]);
  /// ```
  fn subscribe<N>(self, next: N) -> <Self as CoreObservable<FnMutObserver<N>>>::Unsub
  where
    N: FnMut(Self::Item),
    Self: ObservableType<Err = Infallible> + CoreObservable<FnMutObserver<N>>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  /// Subscribe with one closure per signal.
  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> <Self as CoreObservable<AllObserver<N, E, C>>>::Unsub
  where
    N: FnMut(Self::Item),
    E: FnOnce(Self::Err),
    C: FnOnce(),
    Self: CoreObservable<AllObserver<N, E, C>>,
  {
    self.actual_subscribe(AllObserver { next, error, complete })
  }

  /// Subscribe with a custom observer.
  fn subscribe_with<O>(self, observer: O) -> <Self as CoreObservable<O>>::Unsub
  where
    Self: CoreObservable<O>,
  {
    self.actual_subscribe(observer)
  }

  /// Applies `f` to every value, in order.
  ///
  /// `map` does not flatten: if `f` returns an observable, that observable is
  /// delivered as a value, even one that would only ever error.
  fn map<B, F>(self, f: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> B,
  {
    Map { source: self, func: f }
  }

  /// Like `map`, with the zero-based position of the value in this
  /// subscription.
  fn map_with_index<B, F>(self, f: F) -> MapWithIndex<Self, F>
  where
    F: FnMut(Self::Item, usize) -> B,
  {
    MapWithIndex { source: self, func: f }
  }

  /// A fallible `map`: `Err(e)` ends the stream with `e` and unsubscribes
  /// the source.
  fn try_map<B, F>(self, f: F) -> TryMap<Self, F>
  where
    F: FnMut(Self::Item) -> Result<B, Self::Err>,
  {
    TryMap { source: self, func: f }
  }

  /// Projects each value to an inner observable and merges every inner
  /// stream into the output, with no concurrency limit.
  fn merge_map<R, F>(self, project: F) -> MergeMap<Self, F>
  where
    F: FnMut(Self::Item) -> R,
    R: ObservableType<Err = Self::Err>,
  {
    self.merge_map_with(project, MergeMapConfig::default())
  }

  /// `merge_map` with a concurrency limit and an optional queue capacity.
  ///
  /// Values arriving while `concurrent` inners are active wait in FIFO order
  /// and are projected once a slot frees up.
  fn merge_map_with<R, F>(self, project: F, config: MergeMapConfig) -> MergeMap<Self, F>
  where
    F: FnMut(Self::Item) -> R,
    R: ObservableType<Err = Self::Err>,
  {
    MergeMap { source: self, project, config }
  }

  /// Projects each value to an inner observable and subscribes to them one
  /// at a time, in arrival order.
  fn concat_map<R, F>(self, project: F) -> MergeMap<Self, F>
  where
    F: FnMut(Self::Item) -> R,
    R: ObservableType<Err = Self::Err>,
  {
    self.concat_map_with(project, MergeMapConfig::default())
  }

  /// `concat_map` honouring the queue capacity of `config`. The concurrency
  /// setting is forced to 1.
  fn concat_map_with<R, F>(self, project: F, config: MergeMapConfig) -> MergeMap<Self, F>
  where
    F: FnMut(Self::Item) -> R,
    R: ObservableType<Err = Self::Err>,
  {
    self.merge_map_with(project, config.concurrent(1))
  }

  /// Projects each value to an inner observable, keeping only the newest
  /// inner subscription alive.
  fn switch_map<R, F>(self, project: F) -> SwitchMap<Self, F>
  where
    F: FnMut(Self::Item) -> R,
    R: ObservableType<Err = Self::Err>,
  {
    SwitchMap { source: self, project }
  }

  /// Replaces an errored stream with the observable returned by `selector`.
  ///
  /// `selector` receives the error and a [`Caught`] observable. Subscribing
  /// `Caught` subscribes the source again, with this `catch_error` still
  /// attached, so returning it restarts the whole stream.
  ///
  /// ```rust
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use rxlite::prelude::*;
  ///
  /// let seen = Rc::new(RefCell::new(vec![]));
  /// let seen_c = seen.clone();
  /// throw_err::<i32, _>("boom")
  ///   .catch_error(|_, _caught| of(1))
  ///   .on_error(|_| {})
  ///   .subscribe(move |v| seen_c.borrow_mut().push(v));
  /// assert_eq!(*seen.borrow(), vec![1]);
  /// ```
  fn catch_error<R, F>(self, selector: F) -> CatchError<Self, F>
  where
    F: FnMut(Self::Err, Caught<Self::Item, Self::Err>) -> R,
    R: ObservableType<Item = Self::Item, Err = Self::Err>,
  {
    CatchError { source: self, selector }
  }

  /// Resubscribes to the source when it errors, as long as `policy` allows.
  fn retry<P>(self, policy: P) -> Retry<Self, P>
  where
    P: RetryPolicy<Self::Err>,
  {
    Retry { source: self, policy }
  }

  /// Emits the first `count` values, then completes and unsubscribes the
  /// source.
  fn take(self, count: usize) -> Take<Self> { Take { source: self, count } }

  /// Handles the error channel, leaving a stream that cannot fail.
  fn on_error<F>(self, f: F) -> OnError<Self, F>
  where
    F: FnOnce(Self::Err),
  {
    OnError { source: self, callback: f }
  }

  /// Runs `f` when the stream completes, before completion is forwarded.
  fn on_complete<F>(self, f: F) -> OnComplete<Self, F>
  where
    F: FnOnce(),
  {
    OnComplete { source: self, callback: f }
  }

  /// Runs `f` exactly once when the subscription ends: on completion, on
  /// error, or on unsubscribe.
  fn finalize<F>(self, f: F) -> Finalize<Self, F>
  where
    F: FnOnce(),
  {
    Finalize { source: self, func: f }
  }

  /// Erases the concrete type, so observables built differently can share
  /// one type (for example the two arms of an `if` inside a projection).
  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err>
  where
    Self: DynObservable<Self::Item, Self::Err> + 'static,
  {
    BoxedObservable::new(self)
  }
}

impl<T: ObservableType> Observable for T {}
