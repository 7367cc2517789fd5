//! Per-execution context for log correlation.
//!
//! Every payload execution, lifecycle-bound or ad-hoc, runs inside an
//! `execute` span that names the extension and source. Ad-hoc executions also
//! carry the request's correlation id, so log lines can be joined with the
//! response the host receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What triggered an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// A lifecycle phase released the payload.
    Lifecycle {
        /// Phase event name, e.g. `document-start`.
        phase: String,
    },
    /// A host request.
    Request {
        /// Correlation id shared with the host.
        request_id: Uuid,
        /// Target that sent the request.
        sender: u64,
    },
}

/// Context attached to one payload execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Extension the payload runs as.
    pub extension: String,
    /// Source identifier of the payload.
    pub source_id: String,
    /// What triggered the execution.
    pub trigger: Trigger,
    /// When the execution started.
    pub started_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Context for a payload released by a lifecycle phase.
    #[must_use]
    pub fn lifecycle(
        extension: impl Into<String>,
        source_id: impl Into<String>,
        phase: impl Into<String>,
    ) -> Self {
        Self::new(
            extension,
            source_id,
            Trigger::Lifecycle {
                phase: phase.into(),
            },
        )
    }

    /// Context for an ad-hoc request.
    #[must_use]
    pub fn request(
        extension: impl Into<String>,
        source_id: impl Into<String>,
        request_id: Uuid,
        sender: u64,
    ) -> Self {
        Self::new(extension, source_id, Trigger::Request { request_id, sender })
    }

    fn new(extension: impl Into<String>, source_id: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            extension: extension.into(),
            source_id: source_id.into(),
            trigger,
            started_at: Utc::now(),
        }
    }

    /// Correlation id, for ad-hoc executions.
    #[must_use]
    pub fn request_id(&self) -> Option<Uuid> {
        match &self.trigger {
            Trigger::Request { request_id, .. } => Some(*request_id),
            Trigger::Lifecycle { .. } => None,
        }
    }

    /// Milliseconds since the execution started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        // started_at is never in the future
        #[allow(clippy::arithmetic_side_effects)]
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds()
    }

    /// Create the `execute` span for this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        match &self.trigger {
            Trigger::Lifecycle { phase } => tracing::info_span!(
                "execute",
                extension = %self.extension,
                source = %self.source_id,
                phase = %phase,
            ),
            Trigger::Request { request_id, sender } => tracing::info_span!(
                "execute",
                extension = %self.extension,
                source = %self.source_id,
                request_id = %request_id,
                sender = *sender,
            ),
        }
    }
}

/// Keeps the execution span entered and logs the outcome on drop.
pub struct ExecutionGuard {
    context: ExecutionContext,
    succeeded: Option<bool>,
    _span: tracing::span::EnteredSpan,
}

impl ExecutionGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: ExecutionContext) -> Self {
        let span = context.span().entered();
        tracing::trace!("Execution started");
        Self {
            context,
            succeeded: None,
            _span: span,
        }
    }

    /// Record whether the payload completed.
    pub fn record(&mut self, succeeded: bool) {
        self.succeeded = Some(succeeded);
    }

    /// Get the execution context.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.context.elapsed_ms();
        match self.succeeded {
            Some(true) => tracing::debug!(elapsed_ms, "Execution completed"),
            Some(false) => tracing::debug!(elapsed_ms, "Execution failed"),
            None => tracing::debug!(elapsed_ms, "Execution abandoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_keeps_correlation_id() {
        let id = Uuid::new_v4();
        let ctx = ExecutionContext::request("ext1", "adhoc.js", id, 7);
        assert_eq!(ctx.request_id(), Some(id));
        assert_eq!(ctx.trigger, Trigger::Request { request_id: id, sender: 7 });
    }

    #[test]
    fn test_lifecycle_context_has_no_correlation_id() {
        let ctx = ExecutionContext::lifecycle("ext1", "content.js", "idle");
        assert_eq!(ctx.request_id(), None);
        assert_eq!(ctx.extension, "ext1");
        assert_eq!(ctx.source_id, "content.js");
    }

    #[test]
    fn test_guard_records_outcome() {
        let mut guard = ExecutionGuard::new(ExecutionContext::lifecycle("ext1", "a.js", "start"));
        guard.record(false);
        assert_eq!(guard.succeeded, Some(false));
        assert!(guard.context().elapsed_ms() >= 0);
    }

    #[test]
    fn test_trigger_wire_format() {
        let ctx = ExecutionContext::lifecycle("ext1", "a.js", "end");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["trigger"]["kind"], "lifecycle");
        assert_eq!(json["trigger"]["phase"], "end");

        let parsed: ExecutionContext = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.trigger, ctx.trigger);
    }
}
