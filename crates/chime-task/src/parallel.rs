#![forbid(unsafe_code)]

//! Fan-out runner: every step starts immediately; completion waits for all.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::done::{Done, Step};
use crate::queue::{RunError, RunnerConfig, RunnerState, StepQueue};

/// Starts all queued steps in insertion order without waiting between them,
/// then calls the completion callback once every step has signalled.
///
/// Completion order is irrelevant. Each [`Done`] counts once no matter how
/// often it is called, so the countdown cannot underflow.
///
/// Clones share the same queue and state.
#[derive(Clone)]
pub struct ParallelRunner {
    queue: Rc<RefCell<StepQueue>>,
}

impl fmt::Debug for ParallelRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParallelRunner").field(&*self.queue.borrow()).finish()
    }
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelRunner {
    /// Create an idle runner with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create an idle runner.
    #[must_use]
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            queue: Rc::new(RefCell::new(StepQueue::new(config))),
        }
    }

    /// Queue a step. Dropped (returns `false`) while running.
    pub fn add(&self, step: impl FnOnce(Done) + 'static) -> bool {
        self.add_optional(Some(Box::new(step)))
    }

    /// Queue a step that may be absent. `None` is dropped.
    pub fn add_optional(&self, step: Option<Step>) -> bool {
        self.queue.borrow_mut().push(step)
    }

    /// Start every queued step, then call `on_completed` after the last one
    /// signals.
    ///
    /// With nothing queued, `on_completed` runs before this returns. A
    /// runner that is already running refuses the call and never invokes
    /// `on_completed`.
    pub fn run(&self, on_completed: impl FnOnce() + 'static) -> Result<(), RunError> {
        let begun = self.queue.borrow_mut().begin();
        let Some(steps) = begun? else {
            on_completed();
            return Ok(());
        };

        let label = self.queue.borrow().label();
        let remaining = Rc::new(Cell::new(steps.len()));
        let on_completed: Rc<RefCell<Option<Box<dyn FnOnce()>>>> =
            Rc::new(RefCell::new(Some(Box::new(on_completed))));

        for (index, step) in steps.into_iter().enumerate() {
            let queue = Rc::clone(&self.queue);
            let remaining = Rc::clone(&remaining);
            let on_completed = Rc::clone(&on_completed);
            let step_label = label.clone();
            let done = Done::new(index, move || {
                let left = remaining.get().saturating_sub(1);
                remaining.set(left);
                trace!(runner = %step_label, step = index, left, "step finished");
                if left > 0 {
                    return;
                }
                queue.borrow_mut().finish();
                let callback = on_completed.borrow_mut().take();
                if let Some(callback) = callback {
                    callback();
                }
            });
            trace!(runner = %label, step = index, "step started");
            step(done);
        }
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.queue.borrow().state()
    }

    /// Whether a run is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == RunnerState::Running
    }

    /// Queued steps, or the size of the current run while running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Steps dropped by `add` over the runner's lifetime.
    #[must_use]
    pub fn dropped_steps(&self) -> u64 {
        self.queue.borrow().dropped()
    }

    #[must_use]
    pub fn config(&self) -> RunnerConfig {
        self.queue.borrow().config().clone()
    }
}
