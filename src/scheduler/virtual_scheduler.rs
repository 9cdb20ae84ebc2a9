//! Virtual time scheduler.
//!
//! Time stands still until [`VirtualScheduler::advance_by`] or
//! [`VirtualScheduler::flush`] moves it. Due tasks run synchronously, earliest
//! first, FIFO among tasks due at the same instant.

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap, rc::Rc};

use super::{Duration, Scheduler, Task, TaskHandle, TaskState};
use crate::subscription::Subscription;

struct ScheduledTask {
  due: Duration,
  id: usize,
  task: Task,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.id == other.id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by id
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.id.cmp(&self.id))
  }
}

#[derive(Default)]
struct VirtualState {
  now: Duration,
  queue: BinaryHeap<ScheduledTask>,
  next_id: usize,
}

impl VirtualState {
  fn push(&mut self, task: Task, handle: TaskHandle, delay: Duration) {
    let id = self.next_id;
    self.next_id += 1;
    let due = self.now + delay;
    self.queue.push(ScheduledTask { due, id, task, handle });
  }
}

/// A virtual time scheduler for deterministic tests.
///
/// ```rust
/// use std::{cell::Cell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let scheduler = VirtualScheduler::default();
/// let fired = Rc::new(Cell::new(false));
/// scheduler.schedule(
///   Task::new(fired.clone(), |fired| {
///     fired.set(true);
///     TaskState::Finished
///   }),
///   Some(Duration::from_millis(10)),
/// );
/// scheduler.advance_by(Duration::from_millis(9));
/// assert!(!fired.get());
/// scheduler.advance_by(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Clone, Default)]
pub struct VirtualScheduler(Rc<RefCell<VirtualState>>);

impl VirtualScheduler {
  pub fn now(&self) -> Duration { self.0.borrow().now }

  /// Number of tasks still queued, cancelled ones included until they are
  /// reached.
  pub fn pending_count(&self) -> usize { self.0.borrow().queue.len() }

  pub fn is_empty(&self) -> bool { self.0.borrow().queue.is_empty() }

  /// Advance virtual time by `duration`, running every task that falls due.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.now() + duration;
    self.run_until(Some(target));
    self.0.borrow_mut().now = target;
  }

  /// Run until the queue is empty, jumping time to each task's due instant.
  ///
  /// A task that never finishes (an `interval` nobody unsubscribes) keeps
  /// this from returning.
  pub fn flush(&self) { self.run_until(None); }

  fn run_until(&self, limit: Option<Duration>) {
    loop {
      let next = {
        let mut state = self.0.borrow_mut();
        let due = state
          .queue
          .peek()
          .is_some_and(|task| limit.is_none_or(|limit| task.due <= limit));
        if !due {
          return;
        }
        let next = state.queue.pop();
        if let Some(task) = &next {
          state.now = task.due;
        }
        next
      };
      let Some(mut scheduled) = next else {
        return;
      };
      if scheduled.handle.is_closed() {
        continue;
      }

      // The state borrow is released: the task may schedule more work.
      let outcome = scheduled.task.step();
      if scheduled.handle.is_closed() {
        continue;
      }
      match outcome {
        TaskState::Finished => scheduled.handle.mark_finished(),
        TaskState::Yield => {
          self
            .0
            .borrow_mut()
            .push(scheduled.task, scheduled.handle, Duration::ZERO)
        }
        TaskState::Sleeping(delay) => self
          .0
          .borrow_mut()
          .push(scheduled.task, scheduled.handle, delay),
      }
    }
  }
}

impl Scheduler for VirtualScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    self
      .0
      .borrow_mut()
      .push(task, handle.clone(), delay.unwrap_or(Duration::ZERO));
    handle
  }
}
