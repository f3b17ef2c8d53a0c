#![forbid(unsafe_code)]

//! Observable boolean flag with direction-specific callbacks.

use std::fmt;

use chime_core::{Handlers, Subscription};
use tracing::debug;

use crate::value::ObservableValue;

/// An [`ObservableValue<bool>`] with extra became-true / became-false
/// callbacks.
///
/// After every notifying mutation the change callbacks fire first, then
/// exactly one of the true/false callbacks, chosen by the resulting value.
/// The choice ignores the previous value: [`ObservableBool::set_true`] on a
/// flag that is already `true` still fires the true callbacks.
pub struct ObservableBool {
    inner: ObservableValue<bool>,
    became_true: Handlers<()>,
    became_false: Handlers<()>,
}

impl fmt::Debug for ObservableBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableBool")
            .field("value", self.inner.get())
            .field("version", &self.inner.version())
            .field("true_subscribers", &self.became_true.len())
            .field("false_subscribers", &self.became_false.len())
            .finish()
    }
}

impl Default for ObservableBool {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ObservableBool {
    /// Create a flag with an initial value. No callbacks fire.
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self {
            inner: ObservableValue::new(value),
            became_true: Handlers::new(),
            became_false: Handlers::new(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> bool {
        *self.inner.get()
    }

    /// Store `value` and notify.
    pub fn set(&mut self, value: bool) {
        self.inner.set(value);
        self.after_change();
    }

    /// Store `value` without firing any callback.
    pub fn set_silently(&mut self, value: bool) {
        self.inner.set_silently(value);
    }

    /// Store and notify only if `value` differs from the current value.
    ///
    /// Returns `true` if the value changed.
    pub fn set_if_different(&mut self, value: bool) -> bool {
        let changed = self.inner.set_if_different(value);
        if changed {
            self.after_change();
        }
        changed
    }

    /// Negate the value and notify.
    pub fn toggle(&mut self) {
        let next = !self.get();
        self.set(next);
    }

    /// Set to `true` and notify, even if already `true`.
    pub fn set_true(&mut self) {
        self.set(true);
    }

    /// Set to `false` and notify, even if already `false`.
    pub fn set_false(&mut self) {
        self.set(false);
    }

    /// Subscribe to every notifying mutation.
    pub fn subscribe(&mut self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.subscribe(callback)
    }

    /// Subscribe to notifying mutations that leave the flag `true`.
    pub fn on_true(&mut self, callback: impl Fn() + 'static) -> Subscription {
        self.became_true.subscribe(move |_| callback())
    }

    /// Subscribe to notifying mutations that leave the flag `false`.
    pub fn on_false(&mut self, callback: impl Fn() + 'static) -> Subscription {
        self.became_false.subscribe(move |_| callback())
    }

    /// Drop every subscription on all three callback lists.
    pub fn dispose(&mut self) {
        debug!(
            true_subscribers = self.became_true.len(),
            false_subscribers = self.became_false.len(),
            "disposing observable bool"
        );
        self.inner.dispose();
        self.became_true.clear();
        self.became_false.clear();
    }

    /// Store counter, see [`ObservableValue::version`].
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    fn after_change(&mut self) {
        if self.get() {
            self.became_true.notify(&());
        } else {
            self.became_false.notify(&());
        }
    }
}

impl From<bool> for ObservableBool {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}
