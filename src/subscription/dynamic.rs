use smallvec::SmallVec;

/// A keyed set of subscriptions.
///
/// Flattening operators keep one entry per live inner stream. An id can be
/// reserved before the subscription exists (`reserve_id` + `insert`), which
/// lets the inner observer know its own key while the inner stream is still
/// being subscribed.
///
/// ```rust
/// use rxlite::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::default();
/// let first = subs.add(());
/// let second = subs.reserve_id();
/// subs.insert(second, ());
/// assert_eq!(subs.len(), 2);
/// assert!(subs.remove(first).is_some());
/// assert!(subs.remove(first).is_none());
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Insert under an id obtained from `reserve_id`.
  #[inline]
  pub fn insert(&mut self, id: usize, item: U) { self.items.push((id, item)); }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    let pos = self.items.iter().position(|(i, _)| *i == id)?;
    Some(self.items.remove(pos).1)
  }

  pub fn get_mut(&mut self, id: usize) -> Option<&mut U> {
    self
      .items
      .iter_mut()
      .find(|(i, _)| *i == id)
      .map(|(_, item)| item)
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }
}
