//! Messages exchanged with the host process.
//!
//! The host sends [`HostMessage`]s over an mpsc channel: lifecycle events and
//! ad-hoc execution requests. Every request produces exactly one
//! [`ExecuteScriptResponse`], published on the [`ResponseBus`]. Responses
//! carry the request's correlation id, so a listener can subscribe to a single
//! request instead of demultiplexing by channel name.

use std::sync::Arc;

use graft_core::{ExtensionId, LifecyclePhase, RequestId, TargetId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::error::ExecutionError;

/// Default capacity of the response broadcast channel.
pub const DEFAULT_RESPONSE_CAPACITY: usize = 256;

/// An inbound message from the host process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// A document lifecycle event.
    Lifecycle {
        /// The phase that was reached.
        phase: LifecyclePhase,
    },
    /// An on-demand execution request.
    ExecuteScript(ExecuteScriptRequest),
}

/// On-demand request to run code in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteScriptRequest {
    /// Target that sent the request; the response is addressed to it.
    pub sender: TargetId,
    /// Correlation id.
    pub request_id: RequestId,
    /// Extension on whose behalf the code runs.
    pub extension_id: ExtensionId,
    /// Source identifier used in diagnostics.
    pub source_id: String,
    /// The code to run.
    pub code: String,
}

impl ExecuteScriptRequest {
    /// Create a request with a fresh correlation id.
    #[must_use]
    pub fn new(
        sender: TargetId,
        extension_id: ExtensionId,
        source_id: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            request_id: RequestId::new(),
            extension_id,
            source_id: source_id.into(),
            code: code.into(),
        }
    }
}

/// Which stage of execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The code did not parse.
    Compile,
    /// The code threw.
    Runtime,
}

/// Wire form of an [`ExecutionError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    /// Source identifier of the failing code.
    pub source_id: String,
    /// Failure stage.
    pub kind: FailureKind,
    /// Diagnostic message.
    pub message: String,
}

impl From<&ExecutionError> for ExecutionFailure {
    fn from(err: &ExecutionError) -> Self {
        let kind = match err {
            ExecutionError::Compile { .. } => FailureKind::Compile,
            ExecutionError::Runtime { .. } => FailureKind::Runtime,
        };
        Self {
            source_id: err.source_id().to_string(),
            kind,
            message: err.message().to_string(),
        }
    }
}

/// The single reply to an [`ExecuteScriptRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteScriptResponse {
    /// Target the response is addressed to.
    pub target: TargetId,
    /// Correlation id of the request.
    pub request_id: RequestId,
    /// The returned value, or the failure.
    pub outcome: Result<Value, ExecutionFailure>,
}

impl ExecuteScriptResponse {
    /// Build the response for `request` from an execution result.
    #[must_use]
    pub fn for_request(request: &ExecuteScriptRequest, result: &Result<Value, ExecutionError>) -> Self {
        Self {
            target: request.sender,
            request_id: request.request_id,
            outcome: result.as_ref().cloned().map_err(ExecutionFailure::from),
        }
    }

    /// Whether the code ran to completion.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The returned value, if the code ran to completion.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    /// The failure, if the code did not complete.
    #[must_use]
    pub fn failure(&self) -> Option<&ExecutionFailure> {
        self.outcome.as_ref().err()
    }
}

/// Broadcasts ad-hoc responses to every interested listener.
#[derive(Debug, Clone)]
pub struct ResponseBus {
    sender: broadcast::Sender<Arc<ExecuteScriptResponse>>,
    capacity: usize,
}

impl ResponseBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RESPONSE_CAPACITY)
    }

    /// Create a bus with the given capacity (at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish a response. Returns the number of receivers reached.
    pub fn publish(&self, response: ExecuteScriptResponse) -> usize {
        let request_id = response.request_id;
        if let Ok(count) = self.sender.send(Arc::new(response)) {
            debug!(%request_id, receiver_count = count, "Response published");
            count
        } else {
            trace!(%request_id, "No receivers for response");
            0
        }
    }

    /// Receive every response.
    #[must_use]
    pub fn subscribe(&self) -> ResponseReceiver {
        ResponseReceiver::new(self.sender.subscribe(), None)
    }

    /// Receive only the response for `request_id`.
    #[must_use]
    pub fn subscribe_request(&self, request_id: RequestId) -> ResponseReceiver {
        ResponseReceiver::new(self.sender.subscribe(), Some(request_id))
    }

    /// Current number of receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ResponseBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a [`ResponseBus`], optionally filtered by correlation id.
pub struct ResponseReceiver {
    receiver: broadcast::Receiver<Arc<ExecuteScriptResponse>>,
    request_id: Option<RequestId>,
}

impl ResponseReceiver {
    fn new(
        receiver: broadcast::Receiver<Arc<ExecuteScriptResponse>>,
        request_id: Option<RequestId>,
    ) -> Self {
        Self {
            receiver,
            request_id,
        }
    }

    fn matches(&self, response: &ExecuteScriptResponse) -> bool {
        self.request_id.is_none_or(|id| id == response.request_id)
    }

    /// Receive the next matching response.
    ///
    /// Returns `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<Arc<ExecuteScriptResponse>> {
        loop {
            match self.receiver.recv().await {
                Ok(response) => {
                    if self.matches(&response) {
                        return Some(response);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Response receiver lagged, responses dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching response without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<ExecuteScriptResponse>> {
        loop {
            match self.receiver.try_recv() {
                Ok(response) => {
                    if self.matches(&response) {
                        return Some(response);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Response receiver lagged, responses dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}
