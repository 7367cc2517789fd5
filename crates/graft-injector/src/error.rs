//! Error types for matching, scheduling, and executing payloads.

use graft_core::{CoreError, LifecyclePhase};
use thiserror::Error;

/// A payload failed to compile or threw while running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The payload is not valid script.
    #[error("failed to compile {source_id}: {message}")]
    Compile {
        /// Source identifier of the payload.
        source_id: String,
        /// Engine diagnostic, with line numbers relative to the payload text.
        message: String,
    },

    /// The payload threw, or its result could not be converted.
    #[error("{source_id} threw: {message}")]
    Runtime {
        /// Source identifier of the payload.
        source_id: String,
        /// The thrown value, rendered as text.
        message: String,
    },
}

impl ExecutionError {
    /// Source identifier of the failing payload.
    #[must_use]
    pub fn source_id(&self) -> &str {
        match self {
            Self::Compile { source_id, .. } | Self::Runtime { source_id, .. } => source_id,
        }
    }

    /// The underlying diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Compile { message, .. } | Self::Runtime { message, .. } => message,
        }
    }
}

/// The lifecycle scheduler was used out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A task was registered for a start or end phase that already fired.
    #[error("cannot schedule for {phase}: the phase has already fired")]
    PhasePassed {
        /// The phase the task asked for.
        phase: LifecyclePhase,
    },

    /// A lifecycle event arrived repeated or ahead of its predecessor.
    #[error(
        "lifecycle event {received} out of order (expected {})",
        .expected.map_or("none", LifecyclePhase::as_str)
    )]
    OutOfOrder {
        /// The next phase the scheduler would accept, if any.
        expected: Option<LifecyclePhase>,
        /// The phase that was raised.
        received: LifecyclePhase,
    },
}

/// Errors surfaced by the injector API.
#[derive(Debug, Error)]
pub enum InjectorError {
    /// Payload execution failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Scheduler misuse.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Invalid identifier or URL.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for payload execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Result type for injector operations.
pub type InjectorResult<T> = Result<T, InjectorError>;
