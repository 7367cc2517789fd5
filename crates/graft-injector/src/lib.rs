//! Graft Injector - content-script injection for one document context.
//!
//! This crate provides:
//! - [`IsolatedExecutor`]: runs script payloads in a per-extension world and
//!   queues stylesheet payloads until the DOM is ready
//! - [`LifecycleScheduler`]: binds tasks to the start, end, and idle phases
//! - [`Coordinator`]: matches declared content scripts against the document,
//!   schedules their payloads, and answers ad-hoc execution requests
//! - [`ResponseBus`]: correlation-id filtered broadcast of ad-hoc responses
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use graft_core::{ContentScript, DocumentUrl, ExtensionId, LifecyclePhase, RunAt};
//! use graft_injector::{Coordinator, InjectorSettings, RuntimeCapabilityProvider};
//!
//! let url = DocumentUrl::parse("https://a.test/page").unwrap();
//! let mut coordinator = Coordinator::new(
//!     InjectorSettings::default(),
//!     url,
//!     Arc::new(RuntimeCapabilityProvider),
//! );
//!
//! let script = ContentScript::new(["https://a.test/*"])
//!     .with_run_at(RunAt::DocumentStart)
//!     .with_js("content.js", "console.log(chrome.runtime.id)");
//! coordinator.inject_all(&ExtensionId::new("ext1").unwrap(), &[script]);
//!
//! coordinator.fire(LifecyclePhase::Start).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod capability;
pub mod channel;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod executor;
pub mod scheduler;

pub use capability::{CapabilityContext, CapabilityProvider, RuntimeCapabilityProvider};
pub use channel::{
    DEFAULT_RESPONSE_CAPACITY, ExecuteScriptRequest, ExecuteScriptResponse, ExecutionFailure,
    FailureKind, HostMessage, ResponseBus, ResponseReceiver,
};
pub use coordinator::{Coordinator, InjectionReport, InjectorSettings};
pub use document::{Document, StyleElement};
pub use error::{
    ExecutionError, ExecutionResult, InjectorError, InjectorResult, SchedulerError,
};
pub use executor::{IsolatedExecutor, WRAPPER_LINE_OFFSET};
pub use scheduler::{LifecycleScheduler, SchedulerState, Task};
