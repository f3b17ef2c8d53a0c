#![forbid(unsafe_code)]

//! One-shot completion handle handed to every step.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// A unit of work: receives its completion handle and must eventually call
/// [`Done::complete`] exactly once.
pub type Step = Box<dyn FnOnce(Done)>;

type Slot = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

/// Completion handle for one step.
///
/// Clones share the same slot, so a step may hand copies to several
/// callbacks. Only the first [`complete`](Done::complete) across all clones
/// has an effect.
#[derive(Clone)]
pub struct Done {
    step: usize,
    slot: Slot,
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("step", &self.step)
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl Done {
    pub(crate) fn new(step: usize, on_complete: impl FnOnce() + 'static) -> Self {
        Self {
            step,
            slot: Rc::new(RefCell::new(Some(Box::new(on_complete)))),
        }
    }

    /// Signal that the step has finished. Later calls are ignored.
    pub fn complete(&self) {
        let callback = self.slot.borrow_mut().take();
        match callback {
            Some(callback) => callback(),
            None => trace!(step = self.step, "duplicate completion ignored"),
        }
    }

    /// Whether [`complete`](Done::complete) has already been called.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.slot.borrow().is_none()
    }

    /// Position of the step within its run.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fires_once_across_clones() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let done = Done::new(3, move || h.set(h.get() + 1));
        let copy = done.clone();

        assert!(!done.is_completed());
        done.complete();
        copy.complete();
        done.complete();
        assert_eq!(hits.get(), 1);
        assert!(copy.is_completed());
        assert_eq!(copy.step(), 3);
    }

    #[test]
    fn callback_may_complete_reentrantly() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let inner = Rc::new(RefCell::new(None::<Done>));
        let i = Rc::clone(&inner);
        let done = Done::new(0, move || {
            h.set(h.get() + 1);
            if let Some(again) = i.borrow().as_ref() {
                again.complete();
            }
        });
        *inner.borrow_mut() = Some(done.clone());

        done.complete();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn debug_shows_progress() {
        let done = Done::new(1, || {});
        assert_eq!(format!("{done:?}"), "Done { step: 1, completed: false }");
    }
}
