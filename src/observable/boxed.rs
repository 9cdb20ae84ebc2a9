use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer},
  subscription::{BoxedSubscription, IntoBoxedSubscription},
};

/// Object-safe face of an observable with known `Item` and `Err`.
///
/// Implemented for every cloneable `'static` observable that can be
/// subscribed with a [`BoxedObserver`].
pub trait DynObservable<Item, Err> {
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;

  fn box_clone(&self) -> Box<dyn DynObservable<Item, Err>>;
}

impl<T, Item, Err> DynObservable<Item, Err> for T
where
  T: CoreObservable<BoxedObserver<Item, Err>> + Clone + 'static,
  T::Unsub: 'static,
{
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    <T as CoreObservable<BoxedObserver<Item, Err>>>::actual_subscribe(*self, observer).into_boxed()
  }

  fn box_clone(&self) -> Box<dyn DynObservable<Item, Err>> { Box::new(self.clone()) }
}

/// A type-erased observable, made by `Observable::box_it`.
///
/// ```rust
/// use std::{cell::RefCell, convert::Infallible, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let pick = |n: i32| {
///   if n % 2 == 0 { of::<_, Infallible>(n).box_it() } else { empty().box_it() }
/// };
/// let seen = Rc::new(RefCell::new(vec![]));
/// let seen_c = seen.clone();
/// from_iter(1..=4)
///   .merge_map(pick)
///   .subscribe(move |v| seen_c.borrow_mut().push(v));
/// assert_eq!(*seen.borrow(), vec![2, 4]);
/// ```
pub struct BoxedObservable<Item, Err>(Box<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new(source: impl DynObservable<Item, Err> + 'static) -> Self { Self(Box::new(source)) }
}

impl<Item, Err> Clone for BoxedObservable<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.box_clone()) }
}

impl<Item, Err> ObservableType for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err, O> CoreObservable<O> for BoxedObservable<Item, Err>
where
  O: Observer<Item, Err> + 'static,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> BoxedSubscription { self.0.box_subscribe(Box::new(observer)) }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn boxed_observable_is_multi_shot() {
    let seen = Rc::new(RefCell::new(vec![]));
    let boxed = from_iter::<_, Infallible>(vec![1, 2]).map(|v| v + 1).box_it();

    let s = seen.clone();
    boxed.clone().subscribe(move |v| s.borrow_mut().push(v));
    let s = seen.clone();
    boxed.subscribe(move |v| s.borrow_mut().push(v));

    assert_eq!(*seen.borrow(), vec![2, 3, 2, 3]);
  }
}
