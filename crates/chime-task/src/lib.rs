#![forbid(unsafe_code)]

//! Callback-chained task runners for single-threaded, frame-driven code.
//!
//! A *step* is a closure that receives a [`Done`] handle and calls
//! [`Done::complete`] when its work has finished, either on the same call
//! stack or later (for example from a [`Scheduler`] callback).
//!
//! - [`SerialRunner`] starts step *i+1* only after step *i* completes.
//! - [`ParallelRunner`] starts every step up front and completes once all
//!   of them have signalled.
//!
//! Both runners share one lifecycle:
//!
//! ```text
//! Idle ──run()──▶ Running ──last done──▶ Completed ──▶ Idle
//!   ▲                                                    │
//!   └────────────────── reusable ◀──────────────────────┘
//! ```
//!
//! `run()` with no queued steps calls the completion callback immediately
//! and never enters `Running`. Steps added while running, and empty steps,
//! are dropped without error; they are counted in
//! [`SerialRunner::dropped_steps`] and logged at `debug`.
//!
//! There is no cancellation, timeout or error channel. A step that never
//! completes leaves its runner in `Running` for good.
//!
//! All types here are `!Send`. Each runner and scheduler belongs to a single
//! owner on a single thread; clones share state.

pub mod done;
pub mod parallel;
pub mod queue;
pub mod scheduler;
pub mod serial;

pub use done::{Done, Step};
pub use parallel::ParallelRunner;
pub use queue::{RunError, RunnerConfig, RunnerState};
pub use scheduler::{Scheduler, TimerHandle, TimerStatus};
pub use serial::SerialRunner;
