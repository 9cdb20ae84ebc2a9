//! `merge_map` and `concat_map`.
//!
//! Each outer value is projected to an inner observable. Up to `concurrent`
//! inner subscriptions run at once and their values are forwarded as they
//! arrive. Outer values that find every slot taken wait in a FIFO queue and
//! are projected when a slot frees up, so a `concat_map` (concurrency 1)
//! subscribes its inners strictly in arrival order.
//!
//! The output completes once the outer stream has completed, the queue is
//! empty and no inner is active. The first error from any side wins: the
//! outer and every inner are unsubscribed, the queue is dropped and the
//! error is forwarded.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use log::{trace, warn};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  ops::downstream::Downstream,
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::{BoxedSubscription, DynamicSubscriptions, IntoBoxedSubscription, Subscription},
};

/// Concurrency and queueing options for `merge_map_with` and
/// `concat_map_with`.
///
/// ```rust
/// use rxlite::ops::merge_map::MergeMapConfig;
///
/// let config = MergeMapConfig::new().concurrent(2).queue_capacity(16);
/// assert_eq!(config.max_concurrent(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeMapConfig {
  concurrent: usize,
  queue_capacity: Option<usize>,
}

impl MergeMapConfig {
  /// Unbounded concurrency, unbounded queue.
  pub fn new() -> Self { Self { concurrent: usize::MAX, queue_capacity: None } }

  /// At most `n` inner subscriptions at once. `0` behaves like `1`.
  pub fn concurrent(mut self, n: usize) -> Self {
    self.concurrent = n.max(1);
    self
  }

  /// Bounds the queue of waiting outer values. Once it holds `n` values,
  /// newer outer values are dropped.
  pub fn queue_capacity(mut self, n: usize) -> Self {
    self.queue_capacity = Some(n);
    self
  }

  pub fn max_concurrent(&self) -> usize { self.concurrent }
}

impl Default for MergeMapConfig {
  fn default() -> Self { Self::new() }
}

/// Made by `Observable::merge_map` and friends.
#[derive(Clone)]
pub struct MergeMap<S, F> {
  pub(crate) source: S,
  pub(crate) project: F,
  pub(crate) config: MergeMapConfig,
}

impl<S, F, R> ObservableType for MergeMap<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> R,
  R: ObservableType<Err = S::Err>,
{
  type Item = R::Item;
  type Err = S::Err;
}

struct MergeMapState<Item> {
  closed: bool,
  outer_completed: bool,
  // Set while a frame is subscribing queued values; nested frames leave the
  // queue to it.
  draining: bool,
  queue: VecDeque<Item>,
  // `None` while the inner is still inside its own `actual_subscribe`.
  inners: DynamicSubscriptions<Option<BoxedSubscription>>,
  outer: Option<BoxedSubscription>,
}

impl<Item> Default for MergeMapState<Item> {
  fn default() -> Self {
    Self {
      closed: false,
      outer_completed: false,
      draining: false,
      queue: VecDeque::new(),
      inners: DynamicSubscriptions::default(),
      outer: None,
    }
  }
}

impl<Item> MergeMapState<Item> {
  /// Marks the stream closed and hands back everything left to cancel.
  fn close(&mut self) -> (Option<BoxedSubscription>, Vec<Option<BoxedSubscription>>) {
    self.closed = true;
    self.queue.clear();
    (self.outer.take(), self.inners.drain().collect())
  }
}

struct MergeMapCore<O, F, Item, Out, Err> {
  downstream: Downstream<O, Out, Err>,
  state: MutRc<MergeMapState<Item>>,
  project: RefCell<F>,
  config: MergeMapConfig,
  // Set where the inner observable type is known, so the observers below
  // need no bound on it.
  subscribe_inner: fn(&Rc<Self>, Item),
}

impl<O, F, Item, Out, Err> MergeMapCore<O, F, Item, Out, Err>
where
  O: Observer<Out, Err>,
{
  fn is_closed(&self) -> bool { self.state.rc_deref().closed || self.downstream.is_closed() }

  /// Subscribes queued values while slots are free, then completes if
  /// nothing is left to wait for.
  fn drain(self: &Rc<Self>) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.closed || state.draining {
        return;
      }
      state.draining = true;
    }
    loop {
      let value = {
        let mut state = self.state.rc_deref_mut();
        if state.closed || state.inners.len() >= self.config.concurrent {
          None
        } else {
          state.queue.pop_front()
        }
      };
      match value {
        Some(value) => (self.subscribe_inner)(self, value),
        None => break,
      }
    }
    let done = {
      let mut state = self.state.rc_deref_mut();
      state.draining = false;
      !state.closed && state.outer_completed && state.inners.is_empty() && state.queue.is_empty()
    };
    if done {
      self.complete();
    }
  }

  fn complete(&self) {
    let outer = {
      let mut state = self.state.rc_deref_mut();
      state.closed = true;
      state.outer.take()
    };
    drop(outer);
    self.downstream.complete();
  }

  fn fail(&self, err: Err) {
    let (outer, inners) = {
      let mut state = self.state.rc_deref_mut();
      if state.closed {
        return;
      }
      state.close()
    };
    trace!("merge_map: error, cancelling {} inner stream(s)", inners.len());
    outer.unsubscribe();
    for inner in inners {
      inner.unsubscribe();
    }
    self.downstream.error(err);
  }
}

fn subscribe_inner<O, F, R, Item, Out, Err>(
  core: &Rc<MergeMapCore<O, F, Item, Out, Err>>, value: Item,
) where
  F: FnMut(Item) -> R,
  R: CoreObservable<MergeMapInnerObserver<O, F, Item, Out, Err>>,
  R::Unsub: 'static,
{
  let id = {
    let mut state = core.state.rc_deref_mut();
    if state.closed {
      return;
    }
    let id = state.inners.reserve_id();
    state.inners.insert(id, None);
    id
  };
  let inner = {
    let mut project = core.project.borrow_mut();
    (*project)(value)
  };
  trace!("merge_map: subscribing inner stream {id}");
  let unsub = inner.actual_subscribe(MergeMapInnerObserver { core: core.clone(), id });

  let mut state = core.state.rc_deref_mut();
  let leftover = if state.closed {
    Some(unsub)
  } else if let Some(slot) = state.inners.get_mut(id) {
    *slot = Some(unsub.into_boxed());
    None
  } else {
    // Already finished while subscribing.
    Some(unsub)
  };
  drop(state);
  if let Some(unsub) = leftover {
    unsub.unsubscribe();
  }
}

pub struct MergeMapOuterObserver<O, F, Item, Out, Err>(Rc<MergeMapCore<O, F, Item, Out, Err>>);

impl<O, F, Item, Out, Err> Observer<Item, Err> for MergeMapOuterObserver<O, F, Item, Out, Err>
where
  O: Observer<Out, Err>,
{
  fn next(&mut self, value: Item) {
    let core = &self.0;
    {
      let mut state = core.state.rc_deref_mut();
      if state.closed {
        return;
      }
      let slots_full = state.inners.len() >= core.config.concurrent;
      match core.config.queue_capacity {
        Some(capacity) if slots_full && state.queue.len() >= capacity => {
          warn!("merge_map: queue full ({capacity}), dropping outer value");
          return;
        }
        _ => state.queue.push_back(value),
      }
      if slots_full {
        trace!("merge_map: outer value queued, {} waiting", state.queue.len());
      }
    }
    core.drain();
  }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) {
    {
      let mut state = self.0.state.rc_deref_mut();
      if state.closed {
        return;
      }
      state.outer_completed = true;
    }
    self.0.drain();
  }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

pub struct MergeMapInnerObserver<O, F, Item, Out, Err> {
  core: Rc<MergeMapCore<O, F, Item, Out, Err>>,
  id: usize,
}

impl<O, F, Item, Out, Err> Observer<Out, Err> for MergeMapInnerObserver<O, F, Item, Out, Err>
where
  O: Observer<Out, Err>,
{
  fn next(&mut self, value: Out) {
    if !self.core.state.rc_deref().closed {
      self.core.downstream.next(value);
    }
  }

  fn error(self, err: Err) { self.core.fail(err) }

  fn complete(self) {
    {
      let mut state = self.core.state.rc_deref_mut();
      if state.closed || state.inners.remove(self.id).is_none() {
        return;
      }
    }
    self.core.drain();
  }

  fn is_closed(&self) -> bool { self.core.is_closed() }
}

/// Cancels the outer stream, every active inner and the queue.
pub struct MergeMapSubscription<Item>(MutRc<MergeMapState<Item>>);

impl<Item> Subscription for MergeMapSubscription<Item> {
  fn unsubscribe(self) {
    let (outer, inners) = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.close()
    };
    outer.unsubscribe();
    for inner in inners {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl<S, F, R, O, Item, Out, Err> CoreObservable<O> for MergeMap<S, F>
where
  S: ObservableType<Item = Item, Err = Err>,
  S: CoreObservable<MergeMapOuterObserver<O, F, Item, Out, Err>>,
  S::Unsub: 'static,
  F: FnMut(Item) -> R,
  R: ObservableType<Item = Out, Err = Err>,
  R: CoreObservable<MergeMapInnerObserver<O, F, Item, Out, Err>>,
  R::Unsub: 'static,
  O: Observer<Out, Err>,
{
  type Unsub = MergeMapSubscription<Item>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let state = MutRc::own(MergeMapState::default());
    let core = Rc::new(MergeMapCore {
      downstream: Downstream::new(observer),
      state: state.clone(),
      project: RefCell::new(self.project),
      config: self.config,
      subscribe_inner: subscribe_inner::<O, F, R, Item, Out, Err>,
    });
    let unsub = self
      .source
      .actual_subscribe(MergeMapOuterObserver(core));

    let mut guard = state.rc_deref_mut();
    let leftover = if guard.closed {
      Some(unsub)
    } else {
      guard.outer = Some(unsub.into_boxed());
      None
    };
    drop(guard);
    if let Some(unsub) = leftover {
      unsub.unsubscribe();
    }
    MergeMapSubscription(state)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::{Cell, RefCell},
    convert::Infallible,
    rc::Rc,
  };

  use super::*;
  use crate::prelude::*;

  #[rxlite_macro::test]
  fn merges_synchronous_inners() {
    let mut seen = vec![];
    from_iter::<_, Infallible>(1..=3)
      .merge_map(|v| from_iter(vec![v; v]))
      .subscribe(|v| seen.push(v));
    assert_eq!(seen, vec![1, 2, 2, 3, 3, 3]);
  }

  #[rxlite_macro::test]
  fn completes_after_last_inner() {
    let scheduler = VirtualScheduler::default();
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let sch = scheduler.clone();
    from_iter::<_, Infallible>([30u64, 10, 20])
      .merge_map(move |ms| timer(ms, Duration::from_millis(ms), sch.clone()))
      .on_complete(move || l2.borrow_mut().push(0))
      .subscribe(move |v| l1.borrow_mut().push(v));

    scheduler.advance_by(Duration::from_millis(25));
    assert_eq!(*log.borrow(), vec![10, 20]);
    scheduler.advance_by(Duration::from_millis(5));
    assert_eq!(*log.borrow(), vec![10, 20, 30, 0]);
  }

  #[rxlite_macro::test]
  fn bounded_concurrency_queues_the_rest() {
    let scheduler = VirtualScheduler::default();
    let active = Rc::new(Cell::new(0));
    let peak = Rc::new(Cell::new(0));
    let started = Rc::new(RefCell::new(vec![]));

    let (a, p, st, sch) = (active.clone(), peak.clone(), started.clone(), scheduler.clone());
    from_iter::<_, Infallible>(1..=5)
      .merge_map_with(
        move |v: u64| {
          st.borrow_mut().push(v);
          a.set(a.get() + 1);
          p.set(p.get().max(a.get()));
          let a = a.clone();
          timer(v, Duration::from_millis(10), sch.clone()).on_complete(move || a.set(a.get() - 1))
        },
        MergeMapConfig::new().concurrent(2),
      )
      .subscribe(|_| {});

    // Five values arrived at once: two projected, three waiting.
    assert_eq!(*started.borrow(), vec![1, 2]);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*started.borrow(), vec![1, 2, 3, 4]);
    scheduler.flush();
    assert_eq!(*started.borrow(), vec![1, 2, 3, 4, 5]);
    assert_eq!(peak.get(), 2);
    assert_eq!(active.get(), 0);
  }

  #[rxlite_macro::test]
  fn full_queue_drops_newest() {
    let mut subject = Subject::<i32, Infallible>::default();
    let inner = Subject::<i32, Infallible>::default();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    let inner_c = inner.clone();
    subject
      .clone()
      .concat_map_with(
        move |v| inner_c.clone().take(1).map(move |x| x * 100 + v),
        MergeMapConfig::new().queue_capacity(1),
      )
      .subscribe(move |v| s.borrow_mut().push(v));

    subject.next(1);
    subject.next(2);
    subject.next(3);
    let mut inner = inner;
    inner.next(5);
    inner.next(6);
    assert_eq!(*seen.borrow(), vec![501, 602]);
  }

  #[rxlite_macro::test]
  fn first_error_cancels_everything() {
    let scheduler = VirtualScheduler::default();
    let cancelled = Rc::new(Cell::new(0));
    let got = Rc::new(RefCell::new(None));

    let (c, g, sch) = (cancelled.clone(), got.clone(), scheduler.clone());
    from_iter(1..=3)
      .merge_map(move |v| {
        let c = c.clone();
        if v == 3 {
          throw_err::<i32, _>("three").box_it()
        } else {
          timer(v, Duration::from_millis(10), sch.clone())
            .finalize(move || c.set(c.get() + 1))
            .box_it()
        }
      })
      .subscribe_all(|_| panic!("no value expected"), move |e| *g.borrow_mut() = Some(e), || {});

    assert_eq!(*got.borrow(), Some("three"));
    assert_eq!(cancelled.get(), 2);
    scheduler.flush();
    assert!(scheduler.is_empty());
  }

  #[rxlite_macro::test]
  fn unsubscribe_cancels_outer_and_inners() {
    let scheduler = VirtualScheduler::default();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    let sch = scheduler.clone();
    let subscription = interval::<Infallible, _>(Duration::from_millis(10), scheduler.clone())
      .merge_map(move |v| timer(v, Duration::from_millis(15), sch.clone()))
      .subscribe(move |v| s.borrow_mut().push(v));

    scheduler.advance_by(Duration::from_millis(30));
    assert_eq!(*seen.borrow(), vec![0]);
    subscription.unsubscribe();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*seen.borrow(), vec![0]);
    assert!(scheduler.is_empty());
  }

  #[rxlite_macro::test]
  fn zero_concurrency_is_one() {
    assert_eq!(MergeMapConfig::new().concurrent(0).max_concurrent(), 1);
  }

  #[rxlite_macro::test]
  fn downstream_take_stops_synchronous_inner() {
    let pulled = Rc::new(Cell::new(0));
    let p = pulled.clone();
    let mut seen = vec![];
    of::<_, Infallible>(())
      .merge_map(move |_| {
        let p = p.clone();
        from_iter((0..).inspect(move |_| p.set(p.get() + 1)))
      })
      .take(3)
      .subscribe(|v| seen.push(v));

    assert_eq!(seen, vec![0, 1, 2]);
    assert_eq!(pulled.get(), 3);
  }

  #[rxlite_macro::test]
  fn long_queue_drains_iteratively() {
    let mut gate = Subject::<(), Infallible>::default();
    let g = gate.clone();
    let count = Rc::new(Cell::new(0));
    let last = Rc::new(Cell::new(None));
    let (c, l) = (count.clone(), last.clone());
    from_iter::<_, Infallible>(0..20_000)
      .concat_map(move |v| {
        if v == 0 {
          g.clone().take(1).map(move |_| v).box_it()
        } else {
          of::<_, Infallible>(v).box_it()
        }
      })
      .subscribe(move |v| {
        c.set(c.get() + 1);
        l.set(Some(v));
      });

    assert_eq!(count.get(), 0);
    gate.next(());
    assert_eq!(count.get(), 20_000);
    assert_eq!(last.get(), Some(19_999));
  }

  #[rxlite_macro::test]
  fn value_fed_back_into_sibling_inner_is_delivered_after() {
    let inners = vec![Subject::<i32, Infallible>::default(), Subject::default()];
    let pick = inners.clone();
    let mut sibling = inners[1].clone();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    from_iter::<_, Infallible>([0, 1])
      .merge_map(move |i: usize| pick[i].clone())
      .subscribe(move |v| {
        s.borrow_mut().push(v);
        if v == 1 {
          sibling.next(2);
        }
      });

    let mut first = inners[0].clone();
    first.next(1);
    assert_eq!(*seen.borrow(), vec![1, 2]);
  }
}
