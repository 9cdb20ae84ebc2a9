use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::{MutRc, RcDerefMut},
  subscription::Subscription,
};

/// Runs a callback once the subscription ends. Made by
/// `Observable::finalize`.
#[derive(Clone)]
pub struct Finalize<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

/// The callback, shared by the observer and the subscription. Whichever side
/// ends first takes it.
fn run_once<F: FnOnce()>(slot: &MutRc<Option<F>>) {
  let func = slot.rc_deref_mut().take();
  if let Some(func) = func {
    func();
  }
}

pub struct FinalizeObserver<O, F> {
  observer: O,
  func: MutRc<Option<F>>,
}

pub struct FinalizeSubscription<U, F> {
  subscription: U,
  func: MutRc<Option<F>>,
}

impl<S: ObservableType, F> ObservableType for Finalize<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F, O> CoreObservable<O> for Finalize<S, F>
where
  S: CoreObservable<FinalizeObserver<O, F>>,
  F: FnOnce(),
{
  type Unsub = FinalizeSubscription<S::Unsub, F>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let func = MutRc::own(Some(self.func));
    let subscription = self
      .source
      .actual_subscribe(FinalizeObserver { observer, func: func.clone() });
    FinalizeSubscription { subscription, func }
  }
}

impl<Item, Err, O, F> Observer<Item, Err> for FinalizeObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.observer.error(err);
    run_once(&self.func);
  }

  fn complete(self) {
    self.observer.complete();
    run_once(&self.func);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<U, F> Subscription for FinalizeSubscription<U, F>
where
  U: Subscription,
  F: FnOnce(),
{
  fn unsubscribe(self) {
    self.subscription.unsubscribe();
    run_once(&self.func);
  }

  fn is_closed(&self) -> bool { self.subscription.is_closed() }
}
