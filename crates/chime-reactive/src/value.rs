#![forbid(unsafe_code)]

//! Observable value wrapper with notifying and silent setters.
//!
//! # Design
//!
//! [`ObservableValue<T>`] owns a value of type `T` plus a handler list. The
//! notifying setters store the new value and then invoke every live
//! subscriber with a reference to it. [`ObservableValue::set_silently`]
//! stores without notifying, and [`ObservableValue::set_if_different`] skips
//! the store entirely when the new value compares equal to the current one.
//!
//! # Performance
//!
//! | Operation            | Complexity                 |
//! |----------------------|----------------------------|
//! | `get()`              | O(1)                       |
//! | `set()`              | O(S) where S = subscribers |
//! | `set_silently()`     | O(1)                       |
//! | `subscribe()`        | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: a subscriber cannot reach the observable it is
//!   subscribed to through `&mut`, so re-entrant mutation is ruled out at
//!   compile time. Owners that share the observable through
//!   `Rc<RefCell<..>>` will hit a `BorrowMutError` panic instead.

use std::fmt;

use chime_core::{Handlers, Subscription};
use tracing::debug;

/// A value holder with change notification.
///
/// # Invariants
///
/// 1. `set(v)` always stores `v` and notifies once.
/// 2. `set_silently(v)` always stores `v` and never notifies.
/// 3. `set_if_different(v)` with `v == current` neither stores nor notifies.
/// 4. `version` increments by exactly 1 on each store.
pub struct ObservableValue<T> {
    value: T,
    version: u64,
    changed: Handlers<T>,
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &self.value)
            .field("version", &self.version)
            .field("subscriber_count", &self.changed.len())
            .finish()
    }
}

impl<T: Default + 'static> Default for ObservableValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> ObservableValue<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no subscribers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            version: 0,
            changed: Handlers::new(),
        }
    }

    /// Borrow the current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Store `value` unconditionally and notify subscribers.
    pub fn set(&mut self, value: T) {
        self.store(value);
        self.notify();
    }

    /// Store `value` unconditionally without notifying anyone.
    pub fn set_silently(&mut self, value: T) {
        self.store(value);
    }

    /// Modify the value in place via a closure, then notify once.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut self.value);
        self.version += 1;
        self.notify();
        out
    }

    /// Subscribe to changes. The callback receives the newly stored value.
    ///
    /// Returns a [`Subscription`] guard; dropping it unsubscribes.
    pub fn subscribe(&mut self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }

    /// Drop every subscription. The stored value is unaffected.
    pub fn dispose(&mut self) {
        debug!(subscribers = self.changed.len(), "disposing observable value");
        self.changed.clear();
    }

    /// Current version number. Increments by 1 on each store, notifying or
    /// silent. Useful for dirty-checking in frame loops.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of registered subscribers (including dead ones not yet
    /// pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changed.len()
    }

    /// Consume the observable and return the value. Subscriptions are
    /// dropped.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    fn store(&mut self, value: T) {
        self.value = value;
        self.version += 1;
    }

    fn notify(&mut self) {
        self.changed.notify(&self.value);
    }
}

impl<T: PartialEq + 'static> ObservableValue<T> {
    /// Store and notify only if `value` differs from the current value.
    ///
    /// Returns `true` if the value changed.
    pub fn set_if_different(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: 'static> From<T> for ObservableValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for ObservableValue<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de> + 'static> serde::Deserialize<'de> for ObservableValue<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
