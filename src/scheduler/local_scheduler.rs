use super::{Duration, Scheduler, Task, TaskHandle, TaskState};
use crate::subscription::Subscription;

/// Runs tasks on the current tokio `LocalSet` with real timers.
///
/// Must be used from inside `LocalSet::run_until` (or a `LocalSet` driven some
/// other way); `tokio::task::spawn_local` panics elsewhere.
#[derive(Clone, Copy, Default)]
pub struct LocalScheduler;

impl Scheduler for LocalScheduler {
  fn schedule(&self, mut task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let running = handle.clone();
    tokio::task::spawn_local(async move {
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      while !running.is_closed() {
        match task.step() {
          TaskState::Finished => break,
          TaskState::Yield => tokio::task::yield_now().await,
          TaskState::Sleeping(delay) => tokio::time::sleep(delay).await,
        }
      }
      running.mark_finished();
    });
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[rxlite_macro::test(local)]
  async fn runs_after_delay() {
    let log = Rc::new(RefCell::new(vec![]));
    let handle = LocalScheduler.schedule(
      Task::new(log.clone(), |log| {
        log.borrow_mut().push(1);
        TaskState::Finished
      }),
      Some(Duration::from_millis(5)),
    );
    assert!(log.borrow().is_empty());

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(*log.borrow(), vec![1]);
    assert!(handle.is_closed());
  }

  #[rxlite_macro::test(local)]
  async fn cancel_before_due() {
    let log = Rc::new(RefCell::new(vec![]));
    let handle = LocalScheduler.schedule(
      Task::new(log.clone(), |log| {
        log.borrow_mut().push(1);
        TaskState::Finished
      }),
      Some(Duration::from_millis(20)),
    );
    handle.unsubscribe();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(log.borrow().is_empty());
  }
}
