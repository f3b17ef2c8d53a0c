#![forbid(unsafe_code)]

//! Core: change-notification plumbing, error taxonomy, and logging bootstrap.
//!
//! # Role in chime
//! `chime-core` holds the pieces every other chime crate leans on:
//!
//! - **[`Handlers`]**: an ordered list of change callbacks held weakly, with
//!   [`Subscription`] guards that unsubscribe on drop.
//! - **[`Error`]**: the two failure conditions the collections can raise
//!   (`IndexOutOfRange`, `KeyNotFound`).
//! - **`logging`** (feature `logging`): installs a `tracing-subscriber`
//!   formatter from a [`logging::LogConfig`].
//!
//! # Threading
//! Nothing here is `Send` or `Sync`. Every observable, runner and scheduler
//! built on these types has a single logical owner that mutates it from one
//! thread, in the cooperative style of a frame loop.

pub mod error;
pub mod handlers;
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{Error, Result};
pub use handlers::{Handlers, Subscription};
