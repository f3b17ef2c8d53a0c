#![forbid(unsafe_code)]

//! Observable containers for chime.
//!
//! This crate provides owned containers that notify subscribers when they are
//! mutated, alongside a silent mutation path that bypasses notification:
//!
//! - [`ObservableValue`]: a single value with `set`, `set_silently`, and
//!   `set_if_different`.
//! - [`ObservableBool`]: an `ObservableValue<bool>` that additionally fires a
//!   became-true or became-false callback after every notifying mutation.
//! - [`ObservableList`]: an ordered sequence where every structural mutation
//!   notifies exactly once, with `*_silently` counterparts that never do.
//!
//! # Architecture
//!
//! Each container exclusively owns its storage and is mutated through
//! `&mut self`, so a container has one logical owner at a time. Callbacks are
//! registered through [`chime_core::Handlers`] and held weakly; the
//! subscriber keeps the returned [`Subscription`] guard alive for as long as
//! it wants to hear about changes.
//!
//! # Invariants
//!
//! 1. A notifying mutation fires the change callbacks exactly once per call,
//!    regardless of how many elements it touched.
//! 2. A silent mutation never fires any callback and leaves the container in
//!    the same state as its notifying counterpart.
//! 3. `set_if_different(v)` with `v == current` is a no-op.
//! 4. `dispose()` clears every subscription and leaves the contents intact.

pub mod boolean;
pub mod list;
pub mod value;

pub use boolean::ObservableBool;
pub use chime_core::Subscription;
pub use list::ObservableList;
pub use value::ObservableValue;
