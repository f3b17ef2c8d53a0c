#![forbid(unsafe_code)]

//! Chime: small building blocks for single-threaded, frame-driven code.
//!
//! | Module          | Crate               | Contents                                   |
//! |-----------------|---------------------|--------------------------------------------|
//! | [`core`]        | `chime-core`        | `Error`, `Handlers`, `Subscription`        |
//! | [`reactive`]    | `chime-reactive`    | `ObservableValue`, `ObservableBool`, `ObservableList` |
//! | [`collections`] | `chime-collections` | `MultiGroupMap`                            |
//! | [`task`]        | `chime-task`        | `SerialRunner`, `ParallelRunner`, `Scheduler` |
//! | [`random`]      | `chime-random`      | `RandomSource`                             |
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use chime::prelude::*;
//!
//! let mut lives = ObservableValue::new(3u8);
//! let seen = Rc::new(Cell::new(0));
//! let s = Rc::clone(&seen);
//! let _sub = lives.subscribe(move |v| s.set(*v));
//! lives.set(2);
//! assert_eq!(seen.get(), 2);
//!
//! let intro = SerialRunner::new();
//! intro.add(|done| done.complete());
//! intro.run(|| {}).unwrap();
//! assert!(!intro.is_running());
//! ```

pub use chime_collections as collections;
pub use chime_core as core;
pub use chime_random as random;
pub use chime_reactive as reactive;
pub use chime_task as task;

/// Common imports.
pub mod prelude {
    pub use chime_collections::MultiGroupMap;
    pub use chime_core::{Error, Handlers, Result, Subscription};
    pub use chime_random::RandomSource;
    pub use chime_reactive::{ObservableBool, ObservableList, ObservableValue};
    pub use chime_task::{
        Done, ParallelRunner, RunError, RunnerConfig, RunnerState, Scheduler, SerialRunner,
        TimerHandle,
    };
}
