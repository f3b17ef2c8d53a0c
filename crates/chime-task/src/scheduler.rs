#![forbid(unsafe_code)]

//! Cooperative, tick-driven deferred callbacks.
//!
//! The host loop calls [`Scheduler::tick`] once per frame with the elapsed
//! time. Entries wait for a condition, for the next tick, or for a virtual
//! deadline, then run their action once.
//!
//! # Design
//!
//! The clock is virtual: it only moves when `tick` is called, so tests can
//! drive time explicitly. Owner-bound entries hold a `Weak` to their owner
//! and check it when they are about to run, not when they are scheduled.
//!
//! # Invariants
//!
//! 1. Each entry runs its action at most once.
//! 2. Within a tick, due entries run in scheduling order.
//! 3. An entry scheduled during a tick runs no earlier than the next tick.
//! 4. An entry whose owner has been dropped is discarded without running.
//! 5. A cancelled entry never runs, even when cancelled by an earlier
//!    callback in the same tick. This includes `clear()` called from a
//!    callback.
//!
//! # Failure Modes
//!
//! | Failure                      | Behavior                              |
//! |------------------------------|---------------------------------------|
//! | Condition never becomes true | Entry stays pending until cancelled   |
//! | Action panics                | Panic propagates out of `tick`; the   |
//! |                              | unprocessed entries of that tick are  |
//! |                              | lost                                  |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

/// Lifecycle of a scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// Waiting to run.
    Pending,
    /// Action has run.
    Fired,
    /// Cancelled through its handle or [`Scheduler::clear`].
    Cancelled,
    /// Owner was dropped before the action could run.
    Discarded,
}

/// Handle to a scheduled entry.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    status: Rc<Cell<TimerStatus>>,
}

impl TimerHandle {
    fn new(id: u64, status: TimerStatus) -> Self {
        Self {
            id,
            status: Rc::new(Cell::new(status)),
        }
    }

    /// Cancel the entry. Returns whether it was still pending.
    pub fn cancel(&self) -> bool {
        if self.status.get() != TimerStatus::Pending {
            return false;
        }
        self.status.set(TimerStatus::Cancelled);
        trace!(timer = self.id, "timer cancelled");
        true
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status.get() == TimerStatus::Pending
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.status.get()
    }
}

enum Trigger {
    NextTick,
    At(Duration),
    When(Box<dyn FnMut() -> bool>),
}

struct Entry {
    id: u64,
    trigger: Trigger,
    owner_alive: Option<Box<dyn Fn() -> bool>>,
    act: Box<dyn FnOnce()>,
    status: Rc<Cell<TimerStatus>>,
}

#[derive(Default)]
struct SchedulerInner {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
    /// Status cells of entries taken out by a running `tick`. Nested ticks
    /// push on top and truncate back on exit.
    in_tick: Vec<Rc<Cell<TimerStatus>>>,
}

/// Single-threaded deferred-callback queue.
///
/// Clones share the same queue and clock, so a callback may capture a clone
/// and schedule follow-up work.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `act` once `condition` holds.
    ///
    /// If the condition already holds, `act` runs before this returns.
    /// Otherwise the condition is polled once per tick.
    pub fn call_when(
        &self,
        condition: impl FnMut() -> bool + 'static,
        act: impl FnOnce() + 'static,
    ) -> TimerHandle {
        self.schedule_when(None, Box::new(condition), Box::new(act))
    }

    /// Run `act` on the next tick.
    pub fn call_next_tick(&self, act: impl FnOnce() + 'static) -> TimerHandle {
        self.push(Trigger::NextTick, None, Box::new(act))
    }

    /// Run `act` on the first tick at which `delay` has elapsed.
    pub fn call_after(&self, delay: Duration, act: impl FnOnce() + 'static) -> TimerHandle {
        let at = self.now().saturating_add(delay);
        self.push(Trigger::At(at), None, Box::new(act))
    }

    /// [`call_when`](Self::call_when), discarded if `owner` is gone when the
    /// action is due.
    pub fn call_when_bound<O: ?Sized + 'static>(
        &self,
        owner: &Rc<O>,
        condition: impl FnMut() -> bool + 'static,
        act: impl FnOnce() + 'static,
    ) -> TimerHandle {
        self.schedule_when(Some(liveness(owner)), Box::new(condition), Box::new(act))
    }

    /// [`call_next_tick`](Self::call_next_tick), discarded if `owner` is
    /// gone by then.
    pub fn call_next_tick_bound<O: ?Sized + 'static>(
        &self,
        owner: &Rc<O>,
        act: impl FnOnce() + 'static,
    ) -> TimerHandle {
        self.push(Trigger::NextTick, Some(liveness(owner)), Box::new(act))
    }

    /// [`call_after`](Self::call_after), discarded if `owner` is gone by
    /// then.
    pub fn call_after_bound<O: ?Sized + 'static>(
        &self,
        owner: &Rc<O>,
        delay: Duration,
        act: impl FnOnce() + 'static,
    ) -> TimerHandle {
        let at = self.now().saturating_add(delay);
        self.push(Trigger::At(at), Some(liveness(owner)), Box::new(act))
    }

    /// Advance the clock by `delta` and run every due entry.
    ///
    /// Returns the number of actions that ran.
    pub fn tick(&self, delta: Duration) -> usize {
        let (now, entries, mark) = {
            let mut inner = self.inner.borrow_mut();
            inner.now = inner.now.saturating_add(delta);
            let entries = mem::take(&mut inner.entries);
            let mark = inner.in_tick.len();
            inner
                .in_tick
                .extend(entries.iter().map(|e| Rc::clone(&e.status)));
            (inner.now, entries, mark)
        };

        let mut waiting = Vec::with_capacity(entries.len());
        let mut fired = 0;
        for mut entry in entries {
            if entry.status.get() != TimerStatus::Pending {
                continue;
            }
            if entry.owner_alive.as_ref().is_some_and(|alive| !alive()) {
                entry.status.set(TimerStatus::Discarded);
                trace!(timer = entry.id, "timer discarded, owner dropped");
                continue;
            }
            let due = match &mut entry.trigger {
                Trigger::NextTick => true,
                Trigger::At(deadline) => now >= *deadline,
                Trigger::When(condition) => condition(),
            };
            if !due {
                waiting.push(entry);
                continue;
            }
            let Entry { id, act, status, .. } = entry;
            status.set(TimerStatus::Fired);
            trace!(timer = id, ?now, "timer fired");
            act();
            fired += 1;
        }

        // A callback may have cancelled entries that were already set aside.
        waiting.retain(|e| e.status.get() == TimerStatus::Pending);
        let mut inner = self.inner.borrow_mut();
        inner.in_tick.truncate(mark);
        let scheduled_meanwhile = mem::replace(&mut inner.entries, waiting);
        inner.entries.extend(scheduled_meanwhile);
        fired
    }

    /// Virtual time elapsed across all ticks.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Entries still waiting to run, including those set aside by a tick
    /// that is currently running.
    #[must_use]
    pub fn pending(&self) -> usize {
        let inner = self.inner.borrow();
        let queued = inner
            .entries
            .iter()
            .filter(|e| e.status.get() == TimerStatus::Pending)
            .count();
        let in_tick = inner
            .in_tick
            .iter()
            .filter(|s| s.get() == TimerStatus::Pending)
            .count();
        queued + in_tick
    }

    /// Cancel every pending entry.
    ///
    /// Called from inside a callback, this also cancels the entries the
    /// running tick has not reached yet.
    pub fn clear(&self) {
        let (entries, cancelled) = {
            let mut inner = self.inner.borrow_mut();
            let mut cancelled = 0usize;
            for status in &inner.in_tick {
                if status.get() == TimerStatus::Pending {
                    status.set(TimerStatus::Cancelled);
                    cancelled += 1;
                }
            }
            (mem::take(&mut inner.entries), cancelled)
        };
        let mut cancelled = cancelled;
        for entry in &entries {
            if entry.status.get() == TimerStatus::Pending {
                entry.status.set(TimerStatus::Cancelled);
                cancelled += 1;
            }
        }
        trace!(cancelled, "scheduler cleared");
    }

    fn schedule_when(
        &self,
        owner_alive: Option<Box<dyn Fn() -> bool>>,
        mut condition: Box<dyn FnMut() -> bool>,
        act: Box<dyn FnOnce()>,
    ) -> TimerHandle {
        if condition() {
            let handle = TimerHandle::new(self.next_id(), TimerStatus::Fired);
            trace!(timer = handle.id, "condition already met, running now");
            act();
            return handle;
        }
        self.push(Trigger::When(condition), owner_alive, act)
    }

    fn push(
        &self,
        trigger: Trigger,
        owner_alive: Option<Box<dyn Fn() -> bool>>,
        act: Box<dyn FnOnce()>,
    ) -> TimerHandle {
        let handle = TimerHandle::new(self.next_id(), TimerStatus::Pending);
        self.inner.borrow_mut().entries.push(Entry {
            id: handle.id,
            trigger,
            owner_alive,
            act,
            status: Rc::clone(&handle.status),
        });
        handle
    }

    fn next_id(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        inner.next_id
    }
}

fn liveness<O: ?Sized + 'static>(owner: &Rc<O>) -> Box<dyn Fn() -> bool> {
    let weak = Rc::downgrade(owner);
    Box::new(move || weak.strong_count() > 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
