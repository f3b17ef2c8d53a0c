#![forbid(unsafe_code)]

//! Strictly ordered runner: each step starts only after the previous one
//! completes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::done::{Done, Step};
use crate::queue::{RunError, RunnerConfig, RunnerState, StepQueue};

/// Runs queued steps one after another.
///
/// A step that completes synchronously hands control back to the loop that
/// started it, so long chains of synchronous steps run in constant stack
/// depth. A step completed later resumes the chain from its `Done`.
///
/// Clones share the same queue and state.
#[derive(Clone)]
pub struct SerialRunner {
    queue: Rc<RefCell<StepQueue>>,
}

impl fmt::Debug for SerialRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SerialRunner").field(&*self.queue.borrow()).finish()
    }
}

impl Default for SerialRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialRunner {
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

    /// Start the queued steps in order, then call `on_completed`.
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
        let cursor = Rc::new(RefCell::new(Cursor {
            rest: steps.into(),
            next_index: 0,
            on_completed: Some(Box::new(on_completed)),
            driving: false,
            resumed: false,
        }));
        drive(Rc::clone(&self.queue), cursor);
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

/// Progress of one run.
struct Cursor {
    rest: VecDeque<Step>,
    next_index: usize,
    on_completed: Option<Box<dyn FnOnce()>>,
    /// `drive` is on the stack and will pick up the next step itself.
    driving: bool,
    /// The current step completed while `drive` was still inside it.
    resumed: bool,
}

fn drive(queue: Rc<RefCell<StepQueue>>, cursor: Rc<RefCell<Cursor>>) {
    let label = queue.borrow().label();
    loop {
        let next = {
            let mut c = cursor.borrow_mut();
            match c.rest.pop_front() {
                Some(step) => {
                    let index = c.next_index;
                    c.next_index += 1;
                    c.driving = true;
                    c.resumed = false;
                    Some((index, step))
                }
                None => {
                    c.driving = false;
                    None
                }
            }
        };
        let Some((index, step)) = next else {
            let on_completed = cursor.borrow_mut().on_completed.take();
            queue.borrow_mut().finish();
            if let Some(on_completed) = on_completed {
                on_completed();
            }
            return;
        };

        trace!(runner = %label, step = index, "step started");
        let (q, c, step_label) = (Rc::clone(&queue), Rc::clone(&cursor), label.clone());
        let done = Done::new(index, move || {
            trace!(runner = %step_label, step = index, "step finished");
            let inline = {
                let mut cur = c.borrow_mut();
                if cur.driving {
                    cur.resumed = true;
                }
                cur.driving
            };
            if !inline {
                drive(q, c);
            }
        });
        step(done);

        let mut c = cursor.borrow_mut();
        if !c.resumed {
            c.driving = false;
            return;
        }
    }
}
