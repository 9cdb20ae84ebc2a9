//! Prelude module for convenient imports

pub use crate::{
  observable::*,
  observer::{Emitter, Observer},
  ops::{
    catch_error::Caught,
    merge_map::MergeMapConfig,
    retry::{RetryConfig, RetryPolicy},
  },
  scheduler::{Duration, Scheduler, Task, TaskHandle, TaskState, VirtualScheduler},
  subject::*,
  subscription::*,
};
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::LocalScheduler;
