use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

/// Applies a function to every value. Made by `Observable::map`.
#[derive(Clone)]
pub struct Map<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<S, F, B> ObservableType for Map<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> B,
{
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B, O> CoreObservable<O> for Map<S, F>
where
  S: CoreObservable<MapObserver<O, F>>,
  F: FnMut(S::Item) -> B,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(MapObserver { observer, func: self.func })
  }
}

impl<Item, Err, O, F, B> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// `map` with the value's position. Made by `Observable::map_with_index`.
#[derive(Clone)]
pub struct MapWithIndex<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct MapWithIndexObserver<O, F> {
  observer: O,
  func: F,
  index: usize,
}

impl<S, F, B> ObservableType for MapWithIndex<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item, usize) -> B,
{
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B, O> CoreObservable<O> for MapWithIndex<S, F>
where
  S: CoreObservable<MapWithIndexObserver<O, F>>,
  F: FnMut(S::Item, usize) -> B,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(MapWithIndexObserver { observer, func: self.func, index: 0 })
  }
}

impl<Item, Err, O, F, B> Observer<Item, Err> for MapWithIndexObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item, usize) -> B,
{
  fn next(&mut self, value: Item) {
    let index = self.index;
    self.index += 1;
    self.observer.next((self.func)(value, index))
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// A `map` whose function may fail. Made by `Observable::try_map`.
#[derive(Clone)]
pub struct TryMap<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: SerialSubscription,
}

impl<S, F, B> ObservableType for TryMap<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> Result<B, S::Err>,
{
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B, O> CoreObservable<O> for TryMap<S, F>
where
  S: CoreObservable<TryMapObserver<O, F>>,
  S::Unsub: 'static,
  F: FnMut(S::Item) -> Result<B, S::Err>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SerialSubscription::default();
    let observer =
      TryMapObserver { observer: Some(observer), func: self.func, upstream: upstream.clone() };
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, Err, O, F, B> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(v) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(v);
        }
      }
      Err(err) => {
        if let Some(observer) = self.observer.take() {
          observer.error(err);
        }
        self.upstream.clone().unsubscribe();
      }
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.observer.as_ref().is_none_or(|o| o.is_closed()) || self.upstream.is_closed()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn map_preserves_order() {
    let mut seen = vec![];
    from_iter::<_, Infallible>(1..=5)
      .map(|v| v * 2)
      .subscribe(|v| seen.push(v));
    assert_eq!(seen, vec![2, 4, 6, 8, 10]);
  }

  #[rxlite_macro::test]
  fn map_type_change() {
    let mut seen = vec![];
    from_iter::<_, Infallible>(['a', 'b'])
      .map(|c| c.to_string())
      .subscribe(|v| seen.push(v));
    assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
  }

  #[rxlite_macro::test]
  fn map_with_index_counts_per_subscription() {
    let source = from_iter::<_, Infallible>(["x", "y"]).map_with_index(|v, i| format!("{i}{v}"));
    let mut first = vec![];
    source.clone().subscribe(|v| first.push(v));
    let mut second = vec![];
    source.subscribe(|v| second.push(v));
    assert_eq!(first, vec!["0x", "1y"]);
    assert_eq!(first, second);
  }

  #[rxlite_macro::test]
  fn try_map_error_stops_stream() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    from_iter(1..=5)
      .try_map(|v| if v == 3 { Err("three") } else { Ok(v) })
      .subscribe_all(
        move |v| l1.borrow_mut().push(v.to_string()),
        move |e| l2.borrow_mut().push(e.to_string()),
        move || l3.borrow_mut().push("complete".to_string()),
      );
    assert_eq!(*log.borrow(), vec!["1", "2", "three"]);
  }
}
