#![forbid(unsafe_code)]

//! Shared lifecycle state for both runner kinds.

use std::borrow::Cow;
use std::fmt;
use std::mem;

use tracing::{debug, trace, warn};

use crate::done::Step;

/// Runner lifecycle state.
///
/// `Completed` is transient: a runner passes through it on the way back to
/// `Idle` before its completion callback runs, so callers normally observe
/// only `Idle` and `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// Accepting steps; not started.
    #[default]
    Idle,
    /// Steps handed out; waiting for completions.
    Running,
    /// All steps signalled; about to reset.
    Completed,
}

/// Error returned by `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// The runner was started while a previous run is still in flight.
    AlreadyRunning,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "runner is already running"),
        }
    }
}

impl std::error::Error for RunError {}

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Label attached to every event the runner logs.
    pub label: Cow<'static, str>,
    /// Log dropped steps at `debug`. They are counted either way.
    pub log_dropped_steps: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("runner"),
            log_dropped_steps: true,
        }
    }
}

impl RunnerConfig {
    /// Set the log label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Enable or disable logging of dropped steps.
    #[must_use]
    pub fn with_log_dropped_steps(mut self, enabled: bool) -> Self {
        self.log_dropped_steps = enabled;
        self
    }
}

/// Steps plus lifecycle bookkeeping, shared behind `Rc<RefCell<_>>` by a
/// runner and its in-flight completion handles.
pub(crate) struct StepQueue {
    steps: Vec<Step>,
    state: RunnerState,
    in_flight: usize,
    dropped: u64,
    config: RunnerConfig,
}

impl fmt::Debug for StepQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepQueue")
            .field("label", &self.config.label)
            .field("state", &self.state)
            .field("len", &self.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl StepQueue {
    pub(crate) fn new(config: RunnerConfig) -> Self {
        Self {
            steps: Vec::new(),
            state: RunnerState::Idle,
            in_flight: 0,
            dropped: 0,
            config,
        }
    }

    /// Queue a step. Returns `false` when the step was dropped.
    pub(crate) fn push(&mut self, step: Option<Step>) -> bool {
        if self.state != RunnerState::Idle {
            self.drop_step("running");
            return false;
        }
        let Some(step) = step else {
            self.drop_step("empty");
            return false;
        };
        self.steps.push(step);
        true
    }

    /// Start a run.
    ///
    /// `Ok(None)` means there was nothing to run and the state is unchanged.
    pub(crate) fn begin(&mut self) -> Result<Option<Vec<Step>>, RunError> {
        if self.state == RunnerState::Running {
            warn!(runner = %self.config.label, "run refused, already running");
            return Err(RunError::AlreadyRunning);
        }
        if self.steps.is_empty() {
            trace!(runner = %self.config.label, "no steps queued, completing immediately");
            return Ok(None);
        }
        let steps = mem::take(&mut self.steps);
        self.in_flight = steps.len();
        self.transition(RunnerState::Running);
        Ok(Some(steps))
    }

    /// Pass through `Completed` back to `Idle`, clearing the run.
    pub(crate) fn finish(&mut self) {
        self.transition(RunnerState::Completed);
        self.steps.clear();
        self.in_flight = 0;
        self.transition(RunnerState::Idle);
    }

    pub(crate) fn state(&self) -> RunnerState {
        self.state
    }

    /// Steps queued for the next run, or the size of the current run while
    /// running.
    pub(crate) fn len(&self) -> usize {
        match self.state {
            RunnerState::Running => self.in_flight,
            RunnerState::Idle | RunnerState::Completed => self.steps.len(),
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub(crate) fn label(&self) -> Cow<'static, str> {
        self.config.label.clone()
    }

    fn drop_step(&mut self, reason: &'static str) {
        self.dropped += 1;
        if self.config.log_dropped_steps {
            debug!(runner = %self.config.label, reason, "step dropped");
        }
    }

    fn transition(&mut self, next: RunnerState) {
        trace!(runner = %self.config.label, from = ?self.state, to = ?next, "runner transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::done::Done;

    fn noop() -> Option<Step> {
        Some(Box::new(|done: Done| done.complete()))
    }

    #[test]
    fn config_builders() {
        let config = RunnerConfig::default()
            .with_label("loader")
            .with_log_dropped_steps(false);
        assert_eq!(config.label, "loader");
        assert!(!config.log_dropped_steps);
        assert_eq!(RunnerConfig::default().label, "runner");
    }

    #[test]
    fn empty_begin_keeps_idle() {
        let mut queue = StepQueue::new(RunnerConfig::default());
        assert!(matches!(queue.begin(), Ok(None)));
        assert_eq!(queue.state(), RunnerState::Idle);
    }

    #[test]
    fn lifecycle_and_drops() {
        let mut queue = StepQueue::new(RunnerConfig::default());
        assert!(queue.push(noop()));
        assert!(!queue.push(None));
        assert_eq!(queue.dropped(), 1);

        let steps = queue.begin();
        assert!(matches!(steps, Ok(Some(ref s)) if s.len() == 1));
        assert_eq!(queue.state(), RunnerState::Running);
        assert_eq!(queue.len(), 1);

        assert!(!queue.push(noop()));
        assert_eq!(queue.dropped(), 2);
        assert!(matches!(queue.begin(), Err(RunError::AlreadyRunning)));

        queue.finish();
        assert_eq!(queue.state(), RunnerState::Idle);
        assert_eq!(queue.len(), 0);
        assert!(queue.push(noop()));
    }

    #[test]
    fn run_error_display() {
        assert_eq!(RunError::AlreadyRunning.to_string(), "runner is already running");
    }
}
