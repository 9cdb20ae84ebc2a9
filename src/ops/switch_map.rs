//! `switch_map`
//!
//! Projects each outer value to an inner observable and forwards values from
//! the most recent inner only. A new outer value unsubscribes the current
//! inner before the projection runs. The output completes once the outer has
//! completed and the current inner (if any) has completed. Errors from the
//! outer or from the current inner end the stream.
//!
//! ```rust
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let scheduler = VirtualScheduler::default();
//! let mut query = Subject::<&str, Infallible>::default();
//! let results = Rc::new(RefCell::new(vec![]));
//! let sink = results.clone();
//! let sch = scheduler.clone();
//! query
//!   .clone()
//!   .switch_map(move |q| timer(format!("results for {q}"), Duration::from_millis(50), sch.clone()))
//!   .subscribe(move |r| sink.borrow_mut().push(r));
//!
//! query.next("ru");
//! scheduler.advance_by(Duration::from_millis(20));
//! query.next("rust");
//! scheduler.advance_by(Duration::from_millis(50));
//! assert_eq!(*results.borrow(), vec!["results for rust".to_string()]);
//! ```

use std::{cell::RefCell, rc::Rc};

use log::trace;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  ops::downstream::Downstream,
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::{BoxedSubscription, IntoBoxedSubscription, Subscription},
};

/// Made by `Observable::switch_map`.
#[derive(Clone)]
pub struct SwitchMap<S, F> {
  pub(crate) source: S,
  pub(crate) project: F,
}

impl<S, F, R> ObservableType for SwitchMap<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> R,
  R: ObservableType<Err = S::Err>,
{
  type Item = R::Item;
  type Err = S::Err;
}

#[derive(Default)]
struct SwitchState {
  closed: bool,
  outer_completed: bool,
  // Bumped for every outer value; inners from older generations are stale.
  generation: usize,
  inner_active: bool,
  inner: Option<BoxedSubscription>,
  outer: Option<BoxedSubscription>,
}

impl SwitchState {
  fn close(&mut self) -> (Option<BoxedSubscription>, Option<BoxedSubscription>) {
    self.closed = true;
    self.inner_active = false;
    (self.outer.take(), self.inner.take())
  }
}

struct SwitchCore<O, F, Item, Out, Err> {
  downstream: Downstream<O, Out, Err>,
  state: MutRc<SwitchState>,
  project: RefCell<F>,
  subscribe_inner: fn(&Rc<Self>, Item, usize),
}

impl<O, F, Item, Out, Err> SwitchCore<O, F, Item, Out, Err>
where
  O: Observer<Out, Err>,
{
  fn is_current(&self, generation: usize) -> bool {
    let state = self.state.rc_deref();
    !state.closed && state.generation == generation
  }

  fn complete(&self) {
    self.state.rc_deref_mut().closed = true;
    self.downstream.complete();
  }

  fn fail(&self, err: Err) {
    let (outer, inner) = {
      let mut state = self.state.rc_deref_mut();
      if state.closed {
        return;
      }
      state.close()
    };
    outer.unsubscribe();
    inner.unsubscribe();
    self.downstream.error(err);
  }
}

fn subscribe_inner<O, F, R, Item, Out, Err>(
  core: &Rc<SwitchCore<O, F, Item, Out, Err>>, value: Item, generation: usize,
) where
  F: FnMut(Item) -> R,
  R: CoreObservable<SwitchMapInnerObserver<O, F, Item, Out, Err>>,
  R::Unsub: 'static,
{
  let inner = {
    let mut project = core.project.borrow_mut();
    (*project)(value)
  };
  trace!("switch_map: subscribing inner stream {generation}");
  let unsub =
    inner.actual_subscribe(SwitchMapInnerObserver { core: core.clone(), generation });

  let mut state = core.state.rc_deref_mut();
  let keep = !state.closed && state.generation == generation && state.inner_active;
  let leftover = if keep {
    state.inner = Some(unsub.into_boxed());
    None
  } else {
    Some(unsub)
  };
  drop(state);
  if let Some(unsub) = leftover {
    unsub.unsubscribe();
  }
}

pub struct SwitchMapOuterObserver<O, F, Item, Out, Err>(Rc<SwitchCore<O, F, Item, Out, Err>>);

impl<O, F, Item, Out, Err> Observer<Item, Err> for SwitchMapOuterObserver<O, F, Item, Out, Err>
where
  O: Observer<Out, Err>,
{
  fn next(&mut self, value: Item) {
    let core = &self.0;
    let (previous, generation) = {
      let mut state = core.state.rc_deref_mut();
      if state.closed {
        return;
      }
      state.generation += 1;
      state.inner_active = true;
      (state.inner.take(), state.generation)
    };
    if let Some(previous) = previous {
      trace!("switch_map: cancelling inner stream {}", generation - 1);
      previous.unsubscribe();
    }
    (core.subscribe_inner)(core, value, generation);
  }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) {
    let done = {
      let mut state = self.0.state.rc_deref_mut();
      if state.closed {
        return;
      }
      state.outer_completed = true;
      state.outer = None;
      !state.inner_active
    };
    if done {
      self.0.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.state.rc_deref().closed || self.0.downstream.is_closed() }
}

pub struct SwitchMapInnerObserver<O, F, Item, Out, Err> {
  core: Rc<SwitchCore<O, F, Item, Out, Err>>,
  generation: usize,
}

impl<O, F, Item, Out, Err> Observer<Out, Err> for SwitchMapInnerObserver<O, F, Item, Out, Err>
where
  O: Observer<Out, Err>,
{
  fn next(&mut self, value: Out) {
    if self.core.is_current(self.generation) {
      self.core.downstream.next(value);
    }
  }

  fn error(self, err: Err) {
    if self.core.is_current(self.generation) {
      self.core.fail(err);
    }
  }

  fn complete(self) {
    let done = {
      let mut state = self.core.state.rc_deref_mut();
      if state.closed || state.generation != self.generation {
        return;
      }
      state.inner_active = false;
      state.inner = None;
      state.outer_completed
    };
    if done {
      self.core.complete();
    }
  }

  fn is_closed(&self) -> bool {
    !self.core.is_current(self.generation) || self.core.downstream.is_closed()
  }
}

/// Cancels the outer stream and the current inner.
pub struct SwitchMapSubscription(MutRc<SwitchState>);

impl Subscription for SwitchMapSubscription {
  fn unsubscribe(self) {
    let (outer, inner) = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.close()
    };
    outer.unsubscribe();
    inner.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl<S, F, R, O, Item, Out, Err> CoreObservable<O> for SwitchMap<S, F>
where
  S: ObservableType<Item = Item, Err = Err>,
  S: CoreObservable<SwitchMapOuterObserver<O, F, Item, Out, Err>>,
  S::Unsub: 'static,
  F: FnMut(Item) -> R,
  R: ObservableType<Item = Out, Err = Err>,
  R: CoreObservable<SwitchMapInnerObserver<O, F, Item, Out, Err>>,
  R::Unsub: 'static,
  O: Observer<Out, Err>,
{
  type Unsub = SwitchMapSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let state = MutRc::own(SwitchState::default());
    let core = Rc::new(SwitchCore {
      downstream: Downstream::new(observer),
      state: state.clone(),
      project: RefCell::new(self.project),
      subscribe_inner: subscribe_inner::<O, F, R, Item, Out, Err>,
    });
    let unsub = self
      .source
      .actual_subscribe(SwitchMapOuterObserver(core));

    let mut guard = state.rc_deref_mut();
    let leftover = if guard.closed || guard.outer_completed {
      Some(unsub)
    } else {
      guard.outer = Some(unsub.into_boxed());
      None
    };
    drop(guard);
    if let Some(unsub) = leftover {
      unsub.unsubscribe();
    }
    SwitchMapSubscription(state)
  }
}
