//! Per-document lifecycle scheduler.
//!
//! Tasks are bound to one of the three lifecycle phases and handed back to
//! the caller, in registration order, when that phase is raised. The
//! scheduler never runs tasks itself: [`LifecycleScheduler::advance`] and
//! [`LifecycleScheduler::tick`] return them so the owner can run them against
//! state it holds separately.

use std::fmt;

use graft_core::{LateRegistration, LifecyclePhase};
use tracing::{debug, trace};

use crate::error::SchedulerError;

/// A one-shot callback run against the owner's state.
pub type Task<T> = Box<dyn FnOnce(&mut T)>;

/// Position of a document in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchedulerState {
    /// No lifecycle event has been raised yet.
    #[default]
    NotStarted,
    /// `document-start` has fired.
    StartFired,
    /// `document-end` has fired.
    EndFired,
    /// DOM content loaded has fired. Terminal.
    IdleFired,
}

impl SchedulerState {
    /// The most recent phase that fired, if any.
    #[must_use]
    pub fn last_fired(self) -> Option<LifecyclePhase> {
        match self {
            Self::NotStarted => None,
            Self::StartFired => Some(LifecyclePhase::Start),
            Self::EndFired => Some(LifecyclePhase::End),
            Self::IdleFired => Some(LifecyclePhase::Idle),
        }
    }

    /// The phase the scheduler will accept next, if any.
    #[must_use]
    pub fn expected(self) -> Option<LifecyclePhase> {
        match self.last_fired() {
            None => Some(LifecyclePhase::Start),
            Some(phase) => phase.next(),
        }
    }

    /// Whether `phase` has already fired.
    #[must_use]
    pub fn has_fired(self, phase: LifecyclePhase) -> bool {
        self.last_fired().is_some_and(|last| last >= phase)
    }

    fn after(phase: LifecyclePhase) -> Self {
        match phase {
            LifecyclePhase::Start => Self::StartFired,
            LifecyclePhase::End => Self::EndFired,
            LifecyclePhase::Idle => Self::IdleFired,
        }
    }
}

/// Binds tasks to lifecycle phases and releases each exactly once.
pub struct LifecycleScheduler<T> {
    state: SchedulerState,
    late: LateRegistration,
    start: Vec<Task<T>>,
    end: Vec<Task<T>>,
    idle: Vec<Task<T>>,
    /// Late tasks; released by the next tick.
    deferred: Vec<Task<T>>,
}

impl<T> LifecycleScheduler<T> {
    /// Create a scheduler for a document that has not started loading.
    #[must_use]
    pub fn new() -> Self {
        Self::with_late_registration(LateRegistration::default())
    }

    /// Create a scheduler with the given policy for late start/end work.
    #[must_use]
    pub fn with_late_registration(late: LateRegistration) -> Self {
        Self {
            state: SchedulerState::NotStarted,
            late,
            start: Vec::new(),
            end: Vec::new(),
            idle: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether a task for `phase` would be accepted now.
    #[must_use]
    pub fn accepts(&self, phase: LifecyclePhase) -> bool {
        !self.state.has_fired(phase)
            || phase == LifecyclePhase::Idle
            || self.late == LateRegistration::Defer
    }

    /// Register a task for `phase`.
    ///
    /// Idle tasks registered once idle has fired are deferred to the next
    /// [`tick`](Self::tick); they never run synchronously. Late start and end
    /// tasks follow the scheduler's [`LateRegistration`] policy.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PhasePassed`] if `phase` is start or end, has
    /// already fired, and late registrations are rejected.
    pub fn schedule(&mut self, phase: LifecyclePhase, task: Task<T>) -> Result<(), SchedulerError> {
        if self.state.has_fired(phase) {
            if !self.accepts(phase) {
                return Err(SchedulerError::PhasePassed { phase });
            }
            trace!(%phase, "Phase already fired, deferring task to next tick");
            self.deferred.push(task);
            return Ok(());
        }

        self.queue_mut(phase).push(task);
        Ok(())
    }

    /// Raise the lifecycle event for `phase` and take its queued tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::OutOfOrder`] unless `phase` is exactly the
    /// next phase; nothing is released in that case.
    pub fn advance(&mut self, phase: LifecyclePhase) -> Result<Vec<Task<T>>, SchedulerError> {
        let expected = self.state.expected();
        if expected != Some(phase) {
            return Err(SchedulerError::OutOfOrder {
                expected,
                received: phase,
            });
        }

        self.state = SchedulerState::after(phase);
        let tasks = std::mem::take(self.queue_mut(phase));
        debug!(%phase, tasks = tasks.len(), "Lifecycle phase fired");
        Ok(tasks)
    }

    /// Take the tasks deferred since the last tick.
    pub fn tick(&mut self) -> Vec<Task<T>> {
        std::mem::take(&mut self.deferred)
    }

    /// Number of tasks waiting on `phase`.
    #[must_use]
    pub fn pending(&self, phase: LifecyclePhase) -> usize {
        match phase {
            LifecyclePhase::Start => self.start.len(),
            LifecyclePhase::End => self.end.len(),
            LifecyclePhase::Idle => self.idle.len(),
        }
    }

    /// Number of tasks waiting on the next tick.
    #[must_use]
    pub fn deferred(&self) -> usize {
        self.deferred.len()
    }

    fn queue_mut(&mut self, phase: LifecyclePhase) -> &mut Vec<Task<T>> {
        match phase {
            LifecyclePhase::Start => &mut self.start,
            LifecyclePhase::End => &mut self.end,
            LifecyclePhase::Idle => &mut self.idle,
        }
    }
}

impl<T> Default for LifecycleScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LifecycleScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleScheduler")
            .field("state", &self.state)
            .field("late", &self.late)
            .field("start", &self.start.len())
            .field("end", &self.end.len())
            .field("idle", &self.idle.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
