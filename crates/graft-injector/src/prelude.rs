//! Prelude module - commonly used types for convenient import.
//!
//! Use `use graft_injector::prelude::*;` to import all essential types.

// Coordinator
pub use crate::{Coordinator, InjectionReport, InjectorSettings};

// Host messages
pub use crate::{ExecuteScriptRequest, ExecuteScriptResponse, HostMessage, ResponseBus};

// Capabilities
pub use crate::{CapabilityContext, CapabilityProvider, RuntimeCapabilityProvider};

// Errors
pub use crate::{ExecutionError, InjectorError, InjectorResult, SchedulerError};
