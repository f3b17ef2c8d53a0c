#![forbid(unsafe_code)]

//! Observable list: an ordered sequence that notifies on structural change.
//!
//! # Design
//!
//! [`ObservableList<T>`] owns a `Vec<T>` (duplicates allowed, insertion order
//! significant) and a handler list. Every structural mutation fires the
//! change callbacks exactly once per call, with the full post-mutation
//! contents as `&[T]`. Bulk operations (`set`, `remove_all_where`, `extend`,
//! `modify`) still notify once, never once per element.
//!
//! Each notifying operation that has a `*_silently` counterpart performs the
//! identical mutation there, with zero notifications:
//!
//! | Notifying            | Silent                        |
//! |----------------------|-------------------------------|
//! | `push`               | `push_silently`               |
//! | `clear`              | `clear_silently`              |
//! | `remove_where`       | `remove_where_silently`       |
//! | `remove_all_where`   | `remove_all_where_silently`   |
//! | `set`                | `set_silently`                |
//!
//! # Failure Modes
//!
//! | Failure                   | Cause                         | Behavior                          |
//! |---------------------------|-------------------------------|-----------------------------------|
//! | Index past the end        | `at`/`set_at`/`remove_at`     | `Err(IndexOutOfRange)`, no notify |
//! | Insert past `len`         | `insert(index > len, ..)`     | `Err(IndexOutOfRange)`, no notify |
//! | `remove(item)` miss       | item not present              | Returns `false`, still notifies   |
//!
//! Iteration borrows the list, so the borrow checker rejects mutation during
//! iteration outright; there is no runtime invalidation token.

use std::fmt;
use std::ops::Index;

use chime_core::{Error, Handlers, Result, Subscription};
use tracing::debug;

/// An ordered, change-notifying list.
pub struct ObservableList<T> {
    items: Vec<T>,
    changed: Handlers<[T]>,
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.items)
            .field("subscriber_count", &self.changed.len())
            .finish()
    }
}

impl<T: 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ObservableList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an empty list with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Take ownership of `items` as the initial contents.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items,
            changed: Handlers::new(),
        }
    }

    /// Copy `items` into a new list. Later changes to either side are
    /// independent.
    #[must_use]
    pub fn from_slice(items: &[T]) -> Self
    where
        T: Clone,
    {
        Self::from_vec(items.to_vec())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Always `false`; observable lists are mutable.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        false
    }

    /// Element at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Element at `index`, or [`Error::IndexOutOfRange`].
    pub fn at(&self, index: usize) -> Result<&T> {
        self.items
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.items.len()))
    }

    /// First element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Live view of the contents.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate in current insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Snapshot copy of the contents as a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.clone()
    }

    /// Snapshot copy of the contents as a boxed slice.
    #[must_use]
    pub fn to_boxed_slice(&self) -> Box<[T]>
    where
        T: Clone,
    {
        self.items.clone().into_boxed_slice()
    }

    /// Clone the contents into `dest[start..start + len]`.
    pub fn copy_to(&self, dest: &mut [T], start: usize) -> Result<()>
    where
        T: Clone,
    {
        let end = start
            .checked_add(self.items.len())
            .filter(|end| *end <= dest.len())
            .ok_or_else(|| Error::out_of_range(start, dest.len()))?;
        dest[start..end].clone_from_slice(&self.items);
        Ok(())
    }

    // ── Notifying mutations ──────────────────────────────────────────────

    /// Replace the element at `index`, returning the previous one.
    pub fn set_at(&mut self, index: usize, item: T) -> Result<T> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))?;
        let previous = std::mem::replace(slot, item);
        self.notify();
        Ok(previous)
    }

    /// Append `item`.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.notify();
    }

    /// Insert `item` at `index`, shifting later elements right.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::out_of_range(index, self.items.len()));
        }
        self.items.insert(index, item);
        self.notify();
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(Error::out_of_range(index, self.items.len()));
        }
        let removed = self.items.remove(index);
        self.notify();
        Ok(removed)
    }

    /// Remove the first element matching `predicate`.
    ///
    /// Notifies once whether or not anything matched.
    pub fn remove_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let removed = self.remove_where_silently(predicate);
        self.notify();
        removed
    }

    /// Remove every element matching `predicate`, returning how many were
    /// removed.
    ///
    /// Notifies once whether zero, one, or many elements matched.
    pub fn remove_all_where(&mut self, predicate: impl FnMut(&T) -> bool) -> usize {
        let removed = self.remove_all_where_silently(predicate);
        self.notify();
        removed
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.items.clear();
        self.notify();
    }

    /// Replace the whole contents, notifying once after the replacement.
    pub fn set(&mut self, items: impl IntoIterator<Item = T>) {
        self.set_silently(items);
        self.notify();
    }

    /// Shrink to at most `len` elements. Longer targets leave the contents
    /// alone. Notifies once per call.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
        self.notify();
    }

    /// Edit the backing `Vec` directly, then notify once.
    ///
    /// Handy for reorderings such as sorting or shuffling with an injected
    /// random source.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let out = f(&mut self.items);
        self.notify();
        out
    }

    // ── Silent mutations ─────────────────────────────────────────────────

    /// Append `item` without notifying.
    pub fn push_silently(&mut self, item: T) {
        self.items.push(item);
    }

    /// Remove every element without notifying.
    pub fn clear_silently(&mut self) {
        self.items.clear();
    }

    /// Remove the first element matching `predicate` without notifying.
    pub fn remove_where_silently(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(predicate)?;
        Some(self.items.remove(index))
    }

    /// Remove every element matching `predicate` without notifying.
    pub fn remove_all_where_silently(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    /// Replace the whole contents without notifying.
    pub fn set_silently(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.clear();
        self.items.extend(items);
    }

    // ── Subscriptions ────────────────────────────────────────────────────

    /// Subscribe to structural changes. The callback receives the contents
    /// after the mutation.
    pub fn subscribe(&mut self, callback: impl Fn(&[T]) + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }

    /// Drop every subscription. The contents are unaffected.
    pub fn dispose(&mut self) {
        debug!(subscribers = self.changed.len(), "disposing observable list");
        self.changed.clear();
    }

    /// Number of registered subscribers (including dead ones not yet
    /// pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changed.len()
    }

    /// Consume the list and return the contents.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    fn notify(&mut self) {
        self.changed.notify(&self.items);
    }
}

impl<T: PartialEq + 'static> ObservableList<T> {
    /// Whether an element equal to `item` is present.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Index of the first element equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|x| x == item)
    }

    /// Remove the first element equal to `item`, returning whether one was
    /// removed.
    ///
    /// Subscribers are notified even when nothing was removed.
    pub fn remove(&mut self, item: &T) -> bool {
        let removed = match self.index_of(item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        };
        self.notify();
        removed
    }

    /// Toggle membership: remove `item` if present, otherwise append it.
    ///
    /// Returns `true` if the item was added. Exactly one mutation and one
    /// notification either way.
    pub fn add_or_remove(&mut self, item: T) -> bool {
        let added = match self.index_of(&item) {
            Some(index) => {
                self.items.remove(index);
                false
            }
            None => {
                self.items.push(item);
                true
            }
        };
        self.notify();
        added
    }
}

impl<T> Index<usize> for ObservableList<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of bounds; use [`ObservableList::at`] for a
    /// checked lookup.
    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a ObservableList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: 'static> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: 'static> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: 'static> Extend<T> for ObservableList<T> {
    /// Appends every item, then notifies once.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
        self.notify();
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for ObservableList<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de> + 'static> serde::Deserialize<'de> for ObservableList<T> {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_vec)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counted(list: &mut ObservableList<i32>) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = list.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        (count, sub)
    }

    #[test]
    fn construction_copies_source() {
        let source = vec![1, 2, 3];
        let list = ObservableList::from_slice(&source);
        assert_eq!(list.as_slice(), &[1, 2, 3]);
        assert!(!list.is_read_only());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn push_and_insert_notify() {
        let mut list = ObservableList::new();
        let (count, _sub) = counted(&mut list);

        list.push(1);
        list.insert(0, 0).unwrap();
        assert_eq!(list.as_slice(), &[0, 1]);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn subscriber_sees_post_mutation_contents() {
        let mut list = ObservableList::from_vec(vec![1]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = list.subscribe(move |items: &[i32]| *seen_clone.borrow_mut() = items.to_vec());

        list.push(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn out_of_range_does_not_notify() {
        let mut list = ObservableList::from_vec(vec![1, 2]);
        let (count, _sub) = counted(&mut list);

        assert_eq!(list.at(5), Err(Error::IndexOutOfRange { index: 5, len: 2 }));
        assert!(list.set_at(2, 9).is_err());
        assert!(list.insert(3, 9).is_err());
        assert!(list.remove_at(2).is_err());
        assert_eq!(count.get(), 0);
        assert_eq!(list.as_slice(), &[1, 2]);
    }

    #[test]
    fn insert_at_len_appends() {
        let mut list = ObservableList::from_vec(vec![1]);
        list.insert(1, 2).unwrap();
        assert_eq!(list.as_slice(), &[1, 2]);
    }

    #[test]
    fn set_at_returns_previous_and_notifies() {
        let mut list = ObservableList::from_vec(vec![1, 2]);
        let (count, _sub) = counted(&mut list);

        assert_eq!(list.set_at(1, 5), Ok(2));
        assert_eq!(list[1], 5);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn remove_at_returns_element() {
        let mut list = ObservableList::from_vec(vec![4, 5, 6]);
        let (count, _sub) = counted(&mut list);

        assert_eq!(list.remove_at(1), Ok(5));
        assert_eq!(list.as_slice(), &[4, 6]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn remove_missing_item_still_notifies() {
        let mut list = ObservableList::from_vec(vec![1, 2]);
        let (count, _sub) = counted(&mut list);

        assert!(!list.remove(&9));
        assert_eq!(count.get(), 1);
        assert!(list.remove(&1));
        assert_eq!(count.get(), 2);
        assert_eq!(list.as_slice(), &[2]);
    }

    #[test]
    fn remove_where_takes_first_match_only() {
        let mut list = ObservableList::from_vec(vec![1, 2, 3, 4]);
        let (count, _sub) = counted(&mut list);

        assert_eq!(list.remove_where(|x| x % 2 == 0), Some(2));
        assert_eq!(list.as_slice(), &[1, 3, 4]);
        assert_eq!(list.remove_where(|x| *x > 10), None);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn remove_all_where_notifies_once() {
        let mut list = ObservableList::from_vec(vec![1, 2, 2, 2, 2, 2, 3]);
        let (count, _sub) = counted(&mut list);

        assert_eq!(list.remove_all_where(|x| *x == 2), 5);
        assert_eq!(list.as_slice(), &[1, 3]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn set_replaces_and_notifies_once() {
        let mut list = ObservableList::from_vec(vec![1, 2, 3]);
        let (count, _sub) = counted(&mut list);

        list.set([7, 8]);
        assert_eq!(list.as_slice(), &[7, 8]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn add_or_remove_toggles_membership() {
        let mut list = ObservableList::from_vec(vec![1, 2]);
        let (count, _sub) = counted(&mut list);

        assert!(!list.add_or_remove(1));
        assert_eq!(list.as_slice(), &[2]);
        assert!(list.add_or_remove(1));
        assert_eq!(list.as_slice(), &[2, 1]);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn add_or_remove_removes_only_first_duplicate() {
        let mut list = ObservableList::from_vec(vec![3, 1, 3]);
        assert!(!list.add_or_remove(3));
        assert_eq!(list.as_slice(), &[1, 3]);
    }

    #[test]
    fn silent_counterparts_never_notify() {
        let mut list = ObservableList::new();
        let (count, _sub) = counted(&mut list);

        list.push_silently(1);
        list.push_silently(2);
        list.push_silently(2);
        assert_eq!(list.remove_where_silently(|x| *x == 1), Some(1));
        assert_eq!(list.remove_all_where_silently(|x| *x == 2), 2);
        list.set_silently([5, 6]);
        list.clear_silently();
        assert!(list.is_empty());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn clear_and_truncate_notify() {
        let mut list = ObservableList::from_vec(vec![1, 2, 3]);
        let (count, _sub) = counted(&mut list);

        list.truncate(5);
        assert_eq!(list.len(), 3);
        list.truncate(1);
        assert_eq!(list.as_slice(), &[1]);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn extend_and_modify_notify_once() {
        let mut list = ObservableList::new();
        let (count, _sub) = counted(&mut list);

        list.extend([3, 1, 2]);
        list.modify(|items| items.sort_unstable());
        assert_eq!(list.as_slice(), &[1, 2, 3]);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut list = ObservableList::from_vec(vec![1, 2, 3]);
        let snapshot = list.to_vec();
        let boxed = list.to_boxed_slice();

        list.push(4);
        assert_eq!(snapshot, vec![1, 2, 3]);
        assert_eq!(&*boxed, &[1, 2, 3]);
    }

    #[test]
    fn copy_to_checks_bounds() {
        let list = ObservableList::from_vec(vec![1, 2]);
        let mut dest = [0; 4];

        list.copy_to(&mut dest, 1).unwrap();
        assert_eq!(dest, [0, 1, 2, 0]);
        assert_eq!(
            list.copy_to(&mut dest, 3),
            Err(Error::IndexOutOfRange { index: 3, len: 4 })
        );
    }

    #[test]
    fn queries() {
        let list: ObservableList<i32> = [5, 6, 5].into_iter().collect();
        assert!(list.contains(&6));
        assert_eq!(list.index_of(&5), Some(0));
        assert_eq!(list.index_of(&7), None);
        assert_eq!(list.first(), Some(&5));
        assert_eq!(list.last(), Some(&5));
        assert_eq!(list.get(3), None);
        assert_eq!((&list).into_iter().sum::<i32>(), 16);
    }

    #[test]
    fn dispose_keeps_contents() {
        let mut list = ObservableList::from_vec(vec![1]);
        let (count, _sub) = counted(&mut list);

        list.dispose();
        list.push(2);
        assert_eq!(count.get(), 0);
        assert_eq!(list.into_vec(), vec![1, 2]);
    }

    #[test]
    fn debug_format() {
        let list = ObservableList::from_vec(vec![1, 2]);
        let dbg = format!("{list:?}");
        assert!(dbg.contains("ObservableList"));
        assert!(dbg.contains("subscriber_count"));
    }
}
