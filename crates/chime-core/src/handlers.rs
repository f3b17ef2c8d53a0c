#![forbid(unsafe_code)]

//! Multicast change handlers with RAII unsubscription.
//!
//! # Design
//!
//! [`Handlers<A>`] keeps an ordered list of callbacks of type `Fn(&A)`. The
//! list only holds `Weak` references; the strong `Rc` lives inside the
//! [`Subscription`] guard handed back to the subscriber. Dropping the guard
//! is the unsubscribe operation, so one subscriber can never overwrite or
//! silently remove another subscriber's callback.
//!
//! `A` may be unsized, so a list can hand out `&[T]` to its subscribers.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `subscribe()` | O(1) amortized             |
//! | `notify()`    | O(S) where S = subscribers |
//! | `clear()`     | O(S)                       |
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: guards stored indefinitely keep their callbacks
//!   alive. Dead weak references are pruned during `notify()`, and by
//!   `subscribe()` once the list doubles past its last pruned size, so a
//!   list that is never notified stays bounded by twice its live count.
//! - **Detached guard**: after `clear()`, existing guards still own their
//!   callbacks but are no longer reachable from the list; dropping them is a
//!   no-op.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

/// Smallest list length at which `subscribe` prunes dead entries.
const MIN_PRUNE_AT: usize = 16;

/// A subscriber callback stored as a strong `Rc` inside the guard, handed
/// out as `Weak` to the handler list.
type CallbackRc<A> = Rc<dyn Fn(&A)>;
type CallbackWeak<A> = Weak<dyn Fn(&A)>;

/// Ordered multicast callback list.
///
/// # Invariants
///
/// 1. Live subscribers are invoked in registration order.
/// 2. A callback whose [`Subscription`] was dropped is never invoked again.
/// 3. `notify()` on an empty list is a no-op.
pub struct Handlers<A: ?Sized> {
    /// Subscribers stored as weak references. Dead entries are pruned on notify.
    subscribers: Vec<CallbackWeak<A>>,
    /// Length at which `subscribe` next prunes.
    prune_at: usize,
}

impl<A: ?Sized> Default for Handlers<A> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            prune_at: MIN_PRUNE_AT,
        }
    }
}

impl<A: ?Sized> fmt::Debug for Handlers<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("registered", &self.subscribers.len())
            .field("live", &self.live_count())
            .finish()
    }
}

impl<A: ?Sized + 'static> Handlers<A> {
    /// Create an empty handler list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes the
    /// callback (it will not be called after drop, though the dead entry
    /// stays in the list until the next prune).
    pub fn subscribe(&mut self, callback: impl Fn(&A) + 'static) -> Subscription {
        let strong: CallbackRc<A> = Rc::new(callback);
        self.subscribers.push(Rc::downgrade(&strong));
        if self.subscribers.len() >= self.prune_at {
            self.prune();
            self.prune_at = (self.subscribers.len() * 2).max(MIN_PRUNE_AT);
        }
        // `Rc<dyn Fn(&A)>` cannot coerce to `Rc<dyn Any>` directly, so the
        // strong handle is boxed as a sized `dyn Any` value.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Invoke every live callback with `arg` and prune dead ones.
    pub fn notify(&mut self, arg: &A) {
        if self.subscribers.is_empty() {
            return;
        }
        self.prune();
        // Upgrade first so a callback dropping its own guard mid-dispatch
        // cannot free a closure that is still executing.
        let callbacks: Vec<CallbackRc<A>> =
            self.subscribers.iter().filter_map(Weak::upgrade).collect();
        for cb in &callbacks {
            cb(arg);
        }
    }

    /// Forget every registered callback.
    ///
    /// Outstanding [`Subscription`] guards become inert.
    pub fn clear(&mut self) {
        if !self.subscribers.is_empty() {
            trace!(detached = self.subscribers.len(), "handlers cleared");
        }
        self.subscribers.clear();
        self.prune_at = MIN_PRUNE_AT;
    }

    /// Drop dead weak references. Returns how many were removed.
    fn prune(&mut self) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|w| w.strong_count() > 0);
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            trace!(pruned, remaining = self.subscribers.len(), "pruned dead subscribers");
        }
        pruned
    }
}

impl<A: ?Sized> Handlers<A> {
    /// Number of registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Number of callbacks whose guards are still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong `Rc` to the callback, so the
/// `Weak` in the handler list fails to upgrade on the next notification.
#[must_use = "dropping a Subscription immediately unsubscribes its callback"]
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Unsubscribe explicitly. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn notify_without_subscribers_is_noop() {
        let mut handlers: Handlers<i32> = Handlers::new();
        handlers.notify(&1);
        assert!(handlers.is_empty());
    }

    #[test]
    fn subscriber_receives_argument() {
        let mut handlers: Handlers<i32> = Handlers::new();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let _sub = handlers.subscribe(move |v: &i32| seen_clone.set(*v));

        handlers.notify(&42);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn unsized_argument() {
        let mut handlers: Handlers<[u8]> = Handlers::new();
        let total = Rc::new(Cell::new(0usize));
        let total_clone = Rc::clone(&total);
        let _sub = handlers.subscribe(move |bytes: &[u8]| total_clone.set(bytes.len()));

        handlers.notify(&[1, 2, 3][..]);
        assert_eq!(total.get(), 3);
    }

    #[test]
    fn registration_order() {
        let mut handlers: Handlers<()> = Handlers::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _s1 = handlers.subscribe(move |_| log1.borrow_mut().push('A'));
        let log2 = Rc::clone(&log);
        let _s2 = handlers.subscribe(move |_| log2.borrow_mut().push('B'));
        let log3 = Rc::clone(&log);
        let _s3 = handlers.subscribe(move |_| log3.borrow_mut().push('C'));

        handlers.notify(&());
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn dropped_guard_is_pruned_on_notify() {
        let mut handlers: Handlers<()> = Handlers::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = handlers.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        let _other = handlers.subscribe(|_| {});
        assert_eq!(handlers.len(), 2);

        sub.unsubscribe();
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers.live_count(), 1);

        handlers.notify(&());
        assert_eq!(count.get(), 0);
        assert_eq!(handlers.len(), 1);
    }

    #[test]
    fn churn_without_notify_stays_bounded() {
        let mut handlers: Handlers<()> = Handlers::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _kept = handlers.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        for _ in 0..1000 {
            drop(handlers.subscribe(|_| {}));
        }
        assert!(handlers.len() <= MIN_PRUNE_AT, "len = {}", handlers.len());
        assert_eq!(handlers.live_count(), 1);

        handlers.notify(&());
        assert_eq!(count.get(), 1);
        assert_eq!(handlers.len(), 1);
    }

    #[test]
    fn many_live_subscribers_are_not_pruned() {
        let mut handlers: Handlers<()> = Handlers::new();
        let count = Rc::new(Cell::new(0usize));
        let guards: Vec<Subscription> = (0..100)
            .map(|_| {
                let c = Rc::clone(&count);
                handlers.subscribe(move |_| c.set(c.get() + 1))
            })
            .collect();
        assert_eq!(handlers.len(), 100);

        handlers.notify(&());
        assert_eq!(count.get(), guards.len());
    }

    #[test]
    fn clear_detaches_live_guards() {
        let mut handlers: Handlers<()> = Handlers::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = handlers.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        handlers.clear();
        handlers.notify(&());
        assert_eq!(count.get(), 0);
        assert!(handlers.is_empty());
    }

    #[test]
    fn debug_format() {
        let mut handlers: Handlers<()> = Handlers::new();
        let _sub = handlers.subscribe(|_| {});
        let dbg = format!("{handlers:?}");
        assert!(dbg.contains("Handlers"));
        assert!(dbg.contains("live"));
    }

    proptest! {
        #[test]
        fn only_live_guards_fire(keep in proptest::collection::vec(any::<bool>(), 0..32)) {
            let mut handlers: Handlers<()> = Handlers::new();
            let fired = Rc::new(Cell::new(0usize));
            let mut guards = Vec::new();
            for &k in &keep {
                let fired = Rc::clone(&fired);
                let sub = handlers.subscribe(move |_| fired.set(fired.get() + 1));
                if k {
                    guards.push(sub);
                }
            }
            handlers.notify(&());
            prop_assert_eq!(fired.get(), keep.iter().filter(|k| **k).count());
            prop_assert_eq!(handlers.len(), guards.len());
        }
    }
}
