use std::marker::PhantomData;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  scheduler::{Duration, Scheduler, Task, TaskHandle, TaskState},
};

/// Emits one value after a delay, then completes. See [`timer`].
pub struct Timer<Item, Err, S> {
  item: Item,
  delay: Duration,
  scheduler: S,
  _err: PhantomData<fn() -> Err>,
}

/// Emits `item` once `delay` has elapsed on `scheduler`, then completes.
pub fn timer<Item, Err, S: Scheduler>(item: Item, delay: Duration, scheduler: S) -> Timer<Item, Err, S> {
  Timer { item, delay, scheduler, _err: PhantomData }
}

impl<Item: Clone, Err, S: Clone> Clone for Timer<Item, Err, S> {
  fn clone(&self) -> Self {
    Timer {
      item: self.item.clone(),
      delay: self.delay,
      scheduler: self.scheduler.clone(),
      _err: PhantomData,
    }
  }
}

impl<Item, Err, S> ObservableType for Timer<Item, Err, S> {
  type Item = Item;
  type Err = Err;
}

fn fire_once<Item, Err, O>(slot: &mut Option<(Item, O)>) -> TaskState
where
  O: Observer<Item, Err>,
{
  if let Some((item, mut observer)) = slot.take() {
    if !observer.is_closed() {
      observer.next(item);
      observer.complete();
    }
  }
  TaskState::Finished
}

impl<Item, Err, S, O> CoreObservable<O> for Timer<Item, Err, S>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  S: Scheduler,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> TaskHandle {
    let task = Task::new(Some((self.item, observer)), fire_once::<Item, Err, O>);
    self.scheduler.schedule(task, Some(self.delay))
  }
}

/// Emits `0, 1, 2, ...` every `period`. See [`interval`].
pub struct Interval<Err, S> {
  period: Duration,
  scheduler: S,
  _err: PhantomData<fn() -> Err>,
}

/// Emits an increasing counter every `period` on `scheduler`, starting one
/// period after subscription. Never completes on its own.
pub fn interval<Err, S: Scheduler>(period: Duration, scheduler: S) -> Interval<Err, S> {
  Interval { period, scheduler, _err: PhantomData }
}

impl<Err, S: Clone> Clone for Interval<Err, S> {
  fn clone(&self) -> Self {
    Interval { period: self.period, scheduler: self.scheduler.clone(), _err: PhantomData }
  }
}

impl<Err, S> ObservableType for Interval<Err, S> {
  type Item = usize;
  type Err = Err;
}

struct Ticker<O> {
  observer: O,
  count: usize,
  period: Duration,
}

fn tick<Err, O>(ticker: &mut Ticker<O>) -> TaskState
where
  O: Observer<usize, Err>,
{
  if ticker.observer.is_closed() {
    return TaskState::Finished;
  }
  ticker.observer.next(ticker.count);
  ticker.count += 1;
  if ticker.observer.is_closed() { TaskState::Finished } else { TaskState::Sleeping(ticker.period) }
}

impl<Err, S, O> CoreObservable<O> for Interval<Err, S>
where
  O: Observer<usize, Err> + 'static,
  S: Scheduler,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> TaskHandle {
    let ticker = Ticker { observer, count: 0, period: self.period };
    self
      .scheduler
      .schedule(Task::new(ticker, tick::<Err, O>), Some(self.period))
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn timer_fires_at_due_time() {
    let scheduler = VirtualScheduler::default();
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    timer::<_, Infallible, _>("tick", Duration::from_millis(10), scheduler.clone())
      .on_complete(move || l2.borrow_mut().push("done"))
      .subscribe(move |v| l1.borrow_mut().push(v));

    scheduler.advance_by(Duration::from_millis(9));
    assert!(log.borrow().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(*log.borrow(), vec!["tick", "done"]);
  }

  #[rxlite_macro::test]
  fn unsubscribed_timer_is_silent() {
    let scheduler = VirtualScheduler::default();
    let fired = Rc::new(RefCell::new(false));
    let f = fired.clone();
    let subscription = timer::<_, Infallible, _>((), Duration::from_millis(10), scheduler.clone())
      .subscribe(move |_| *f.borrow_mut() = true);
    subscription.unsubscribe();
    scheduler.flush();
    assert!(!*fired.borrow());
  }

  #[rxlite_macro::test]
  fn interval_ticks_until_unsubscribed() {
    let scheduler = VirtualScheduler::default();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    let subscription = interval::<Infallible, _>(Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| s.borrow_mut().push(v));

    scheduler.advance_by(Duration::from_millis(35));
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);

    subscription.unsubscribe();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert!(scheduler.is_empty());
  }
}
