//! Scheduling of deferred work.
//!
//! Time-based sources (`timer`, `interval`) never sleep themselves. They hand
//! a [`Task`] to a [`Scheduler`] value passed in by the caller. Two schedulers
//! ship with the crate:
//!
//! - [`VirtualScheduler`]: virtual time advanced explicitly, for deterministic
//!   tests.
//! - `LocalScheduler` (feature `tokio-scheduler`): runs tasks on the current
//!   tokio `LocalSet` using real timers.

use std::{cell::Cell, rc::Rc};

pub use std::time::Duration;

use crate::subscription::Subscription;

mod virtual_scheduler;
pub use virtual_scheduler::VirtualScheduler;

#[cfg(feature = "tokio-scheduler")]
mod local_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use local_scheduler::LocalScheduler;

/// What a task wants after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  Finished,
  /// Run again as soon as possible.
  Yield,
  /// Run again after the given duration.
  Sleeping(Duration),
}

/// A unit of work that can be stepped repeatedly until it reports
/// `TaskState::Finished`.
pub struct Task(Box<dyn FnMut() -> TaskState>);

impl Task {
  pub fn new<S: 'static>(mut state: S, handler: fn(&mut S) -> TaskState) -> Self {
    Task(Box::new(move || handler(&mut state)))
  }

  #[inline]
  pub fn step(&mut self) -> TaskState { (self.0)() }
}

/// Handle to a scheduled task. Unsubscribing it cancels every future step.
#[derive(Clone, Default)]
pub struct TaskHandle(Rc<Cell<bool>>);

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  pub fn mark_finished(&self) { self.0.set(true) }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) { self.0.set(true) }

  fn is_closed(&self) -> bool { self.0.get() }
}

/// Orders tasks and runs them, possibly after a delay.
///
/// Schedulers are cheap handles; clones drive the same queue.
pub trait Scheduler: Clone + 'static {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle;
}
