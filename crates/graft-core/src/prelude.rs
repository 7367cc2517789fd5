//! Prelude module - commonly used types for convenient import.
//!
//! Use `use graft_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult, PatternError};

// Identifiers
pub use crate::{ExtensionId, RequestId, TargetId};

// Declarations
pub use crate::{ContentScript, ExtensionDeclaration, Payload, RunAt};

// Matching
pub use crate::{DocumentUrl, MatchPattern};

// Lifecycle
pub use crate::{LateRegistration, LifecyclePhase};
