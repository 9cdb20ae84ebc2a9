//! # rxlite: a small reactive-stream core
//!
//! Single-threaded [Reactive Extensions](http://reactivex.io/) with typed
//! errors, the flattening operators and error recovery.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let sink = seen.clone();
//! from_iter::<_, Infallible>(1..=3)
//!   .map(|v| v * 10)
//!   .concat_map(|v| from_iter([v, v + 1]))
//!   .subscribe(move |v| sink.borrow_mut().push(v));
//!
//! assert_eq!(*seen.borrow(), vec![10, 11, 20, 21, 30, 31]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | The operator and subscribe methods of every stream |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` signals |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Runs delayed work; [`VirtualScheduler`] drives it by hand |
//!
//! Errors are typed: a stream of `Item` that can fail with `Err` only accepts
//! observers that handle `Err`. `subscribe` with a single closure is only
//! available once the error type is `Infallible`.
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): `LocalScheduler`, backed by Tokio's
//!   `spawn_local`
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`VirtualScheduler`]: scheduler::VirtualScheduler

pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use prelude::*;

#[cfg(doctest)]
mod readme {
  #![doc = include_str!("../README.md")]
}
