#![forbid(unsafe_code)]

//! Mapping from a key to a growable, ordered group of values.
//!
//! # Invariants
//!
//! 1. Every present key maps to a non-empty group. Groups are created by the
//!    first `add` for a key; there is no "insert empty group" operation, and
//!    operations that would leave a group empty remove the key instead.
//! 2. Values within a group keep insertion order.
//! 3. Iteration order across keys is unspecified.
//!
//! # Failure Modes
//!
//! | Failure      | Cause                | Behavior             |
//! |--------------|----------------------|----------------------|
//! | Missing key  | `get` on absent key  | `Err(KeyNotFound)`   |
//! | Missing key  | `try_get`            | `None`               |
//! | Missing key  | `get_or_empty`       | empty slice          |
//!
//! Unlike the observable containers, this map has no change notification.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::{self, RandomState};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use chime_core::{Error, Result};

/// Key → ordered group of values.
///
/// The hasher parameter `S` plays the role of a custom key equality: supply
/// one through [`MultiGroupMap::with_hasher`].
#[derive(Clone)]
pub struct MultiGroupMap<K, V, S = RandomState> {
    groups: HashMap<K, Vec<V>, S>,
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for MultiGroupMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.groups.iter()).finish()
    }
}

impl<K, V, S: Default> Default for MultiGroupMap<K, V, S> {
    fn default() -> Self {
        Self {
            groups: HashMap::default(),
        }
    }
}

impl<K, V> MultiGroupMap<K, V, RandomState> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map with room for `capacity` keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            groups: HashMap::with_capacity(capacity),
        }
    }
}

impl<K, V, S> MultiGroupMap<K, V, S> {
    /// Create an empty map using `hasher` for keys.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            groups: HashMap::with_hasher(hasher),
        }
    }

    /// Create an empty map with room for `capacity` keys, using `hasher`.
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            groups: HashMap::with_capacity_and_hasher(capacity, hasher),
        }
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of values across all groups.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Iterate over keys.
    pub fn keys(&self) -> hash_map::Keys<'_, K, Vec<V>> {
        self.groups.keys()
    }

    /// Iterate over groups.
    pub fn values(&self) -> impl Iterator<Item = &[V]> {
        self.groups.values().map(Vec::as_slice)
    }

    /// Iterate over `(key, group)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> MultiGroupMap<K, V, S> {
    /// Append `value` to the group for `key`, creating the group if needed.
    pub fn add(&mut self, key: K, value: V) {
        self.groups.entry(key).or_default().push(value);
    }

    /// Append every value in order, as if calling [`add`](Self::add) for each.
    ///
    /// An empty `values` leaves the map untouched; no empty group is created.
    pub fn add_all(&mut self, key: K, values: impl IntoIterator<Item = V>) {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return;
        }
        self.groups.entry(key).or_default().extend(values);
    }

    /// Remove `key` and its whole group. Returns whether the key was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.groups.remove(key).is_some()
    }

    /// Remove `key` and return its group.
    pub fn take<Q>(&mut self, key: &Q) -> Option<Vec<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.groups.remove(key)
    }

    /// Remove the first value equal to `value` from the group for `key`.
    ///
    /// Drops the key when its group becomes empty. Returns whether a value
    /// was removed.
    pub fn remove_value<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        let Some(group) = self.groups.get_mut(key) else {
            return false;
        };
        let Some(index) = group.iter().position(|v| v == value) else {
            return false;
        };
        group.remove(index);
        if group.is_empty() {
            self.groups.remove(key);
        }
        true
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.groups.contains_key(key)
    }

    /// Group for `key`, or `None`.
    #[must_use]
    pub fn try_get<Q>(&self, key: &Q) -> Option<&[V]>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Group for `key`, or [`Error::KeyNotFound`].
    pub fn get<Q>(&self, key: &Q) -> Result<&[V]>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.try_get(key).ok_or(Error::KeyNotFound)
    }

    /// Group for `key`, or an empty slice.
    #[must_use]
    pub fn get_or_empty<Q>(&self, key: &Q) -> &[V]
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.try_get(key).unwrap_or(&[])
    }

    /// Replace the group for `key` wholesale, creating the key if absent.
    ///
    /// Returns the previous group. Replacing with an empty group removes the
    /// key.
    pub fn replace(&mut self, key: K, values: Vec<V>) -> Option<Vec<V>> {
        if values.is_empty() {
            return self.groups.remove(&key);
        }
        self.groups.insert(key, values)
    }
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> FromIterator<(K, V)> for MultiGroupMap<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> Extend<(K, V)> for MultiGroupMap<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl<K, V, S> IntoIterator for MultiGroupMap<K, V, S> {
    type Item = (K, Vec<V>);
    type IntoIter = hash_map::IntoIter<K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

#[cfg(feature = "serde")]
impl<K, V, S> serde::Serialize for MultiGroupMap<K, V, S>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<Ser: serde::Serializer>(
        &self,
        serializer: Ser,
    ) -> std::result::Result<Ser::Ok, Ser::Error> {
        serializer.collect_map(self.groups.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::Deserialize<'de> for MultiGroupMap<K, V, S>
where
    K: serde::Deserialize<'de> + Eq + Hash,
    V: serde::Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let mut groups = HashMap::<K, Vec<V>, S>::deserialize(deserializer)?;
        groups.retain(|_, group| !group.is_empty());
        Ok(Self { groups })
    }
}
