use std::marker::PhantomData;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits one value, then completes.
pub struct Of<Item, Err> {
  value: Item,
  _err: PhantomData<fn() -> Err>,
}

/// Creates an observable that emits `value` and completes.
pub fn of<Item, Err>(value: Item) -> Of<Item, Err> { Of { value, _err: PhantomData } }

impl<Item: Clone, Err> Clone for Of<Item, Err> {
  fn clone(&self) -> Self { of(self.value.clone()) }
}

impl<Item, Err> ObservableType for Of<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err, O> CoreObservable<O> for Of<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    if observer.is_closed() {
      return;
    }
    observer.next(self.value);
    if !observer.is_closed() {
      observer.complete();
    }
  }
}

/// Emits every item of an iterator, then completes.
pub struct FromIter<I, Err> {
  iter: I,
  _err: PhantomData<fn() -> Err>,
}

/// Creates an observable from anything iterable. Each subscription iterates
/// a fresh clone of `iter`.
pub fn from_iter<I, Err>(iter: I) -> FromIter<I, Err>
where
  I: IntoIterator,
{
  FromIter { iter, _err: PhantomData }
}

impl<I: Clone, Err> Clone for FromIter<I, Err> {
  fn clone(&self) -> Self { FromIter { iter: self.iter.clone(), _err: PhantomData } }
}

impl<I: IntoIterator, Err> ObservableType for FromIter<I, Err> {
  type Item = I::Item;
  type Err = Err;
}

impl<I, Err, O> CoreObservable<O> for FromIter<I, Err>
where
  I: IntoIterator,
  O: Observer<I::Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    // Checked before every pull, so a closed observer leaves the rest of the
    // iterator untouched.
    let mut iter = self.iter.into_iter();
    while !observer.is_closed() {
      match iter.next() {
        Some(v) => observer.next(v),
        None => {
          observer.complete();
          return;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn of_emits_then_completes() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    of::<_, Infallible>(7)
      .on_complete(move || l2.borrow_mut().push(-1))
      .subscribe(move |v| l1.borrow_mut().push(v));
    assert_eq!(*log.borrow(), vec![7, -1]);
  }

  #[rxlite_macro::test]
  fn from_iter_stops_once_closed() {
    let pulled = Rc::new(RefCell::new(0));
    let p = pulled.clone();
    let source = from_iter::<_, Infallible>((0..100).inspect(move |_| *p.borrow_mut() += 1));

    let mut seen = vec![];
    source.take(3).subscribe(|v| seen.push(v));

    assert_eq!(seen, vec![0, 1, 2]);
    assert_eq!(*pulled.borrow(), 3);
  }
}
