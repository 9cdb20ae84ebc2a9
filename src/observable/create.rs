use std::marker::PhantomData;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{Emitter, Observer},
  subscription::Subscription,
};

/// Observable built from a subscribe function. See [`create`].
pub struct Create<F, Item, Err> {
  func: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

/// Creates an observable from a function run once per subscription.
///
/// The function receives an [`Emitter`] and returns the teardown for that
/// subscription. Signals after a terminal one, or after the subscriber went
/// away, are ignored.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::{prelude::*, subscription::ClosureSubscription};
///
/// let torn_down = Rc::new(RefCell::new(false));
/// let flag = torn_down.clone();
/// let subscription = create::<_, i32, std::convert::Infallible, _>(move |emitter| {
///   emitter.next(1);
///   let flag = flag.clone();
///   ClosureSubscription(move || *flag.borrow_mut() = true)
/// })
/// .subscribe(|_| {});
///
/// subscription.unsubscribe();
/// assert!(*torn_down.borrow());
/// ```
pub fn create<F, Item, Err, U>(func: F) -> Create<F, Item, Err>
where
  F: FnOnce(&mut dyn Emitter<Item, Err>) -> U,
  U: Subscription,
{
  Create { func, _marker: PhantomData }
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { func: self.func.clone(), _marker: PhantomData } }
}

impl<F, Item, Err> ObservableType for Create<F, Item, Err> {
  type Item = Item;
  type Err = Err;
}

struct CreateEmitter<O>(Option<O>);

impl<O, Item, Err> Emitter<Item, Err> for CreateEmitter<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.0.as_mut().filter(|o| !o.is_closed()) {
      observer.next(value);
    }
  }

  fn error(&mut self, err: Err) {
    if let Some(observer) = self.0.take() {
      observer.error(err);
    }
  }

  fn complete(&mut self) {
    if let Some(observer) = self.0.take() {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.as_ref().is_none_or(|o| o.is_closed()) }
}

impl<F, Item, Err, U, O> CoreObservable<O> for Create<F, Item, Err>
where
  O: Observer<Item, Err>,
  F: FnOnce(&mut dyn Emitter<Item, Err>) -> U,
  U: Subscription,
{
  type Unsub = U;

  fn actual_subscribe(self, observer: O) -> U {
    let mut emitter = CreateEmitter(Some(observer));
    (self.func)(&mut emitter)
  }
}
