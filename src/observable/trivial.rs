use std::marker::PhantomData;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

macro_rules! phantom_source {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    pub struct $name<Item, Err>(PhantomData<fn() -> (Item, Err)>);

    impl<Item, Err> Clone for $name<Item, Err> {
      fn clone(&self) -> Self { $name(PhantomData) }
    }

    impl<Item, Err> ObservableType for $name<Item, Err> {
      type Item = Item;
      type Err = Err;
    }
  };
}

phantom_source!(
  /// Completes immediately without emitting.
  Empty
);
phantom_source!(
  /// Never emits and never terminates.
  Never
);

pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

pub fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

impl<Item, Err, O> CoreObservable<O> for Empty<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.complete();
    }
  }
}

impl<Item, Err, O> CoreObservable<O> for Never<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, _: O) -> Self::Unsub {}
}

/// Errors with a stored error as soon as it is subscribed.
///
/// Creating a `ThrowErr` does nothing by itself. Returned from `map`, it is
/// just a value; only something that subscribes it (a flattening operator,
/// `catch_error`) turns it into an error signal.
pub struct ThrowErr<Item, Err> {
  err: Err,
  _item: PhantomData<fn() -> Item>,
}

pub fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> {
  ThrowErr { err, _item: PhantomData }
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { throw_err(self.err.clone()) }
}

impl<Item, Err> ObservableType for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err, O> CoreObservable<O> for ThrowErr<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.error(self.err);
    }
  }
}
