//! Graft Core - Foundation types for the Graft content-script injector.
//!
//! This crate provides:
//! - Identifiers for extensions, targets, and ad-hoc requests
//! - Content-script declarations (`matches`, `js`, `css`, `run_at`)
//! - Match patterns and the document URL form they are evaluated against
//! - Document lifecycle phases
//!
//! # Example
//!
//! ```rust
//! use graft_core::{DocumentUrl, MatchPattern};
//!
//! let url = DocumentUrl::parse("https://sub.example.com/path?x=1").unwrap();
//! let pattern = MatchPattern::new("https://*.example.com/*").unwrap();
//! assert!(pattern.matches(&url));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod declaration;
pub mod document_url;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod pattern;

pub use declaration::{ContentScript, ExtensionDeclaration, Payload, RunAt};
pub use document_url::DocumentUrl;
pub use error::{CoreError, CoreResult, PatternError};
pub use ids::{ExtensionId, RequestId, TargetId};
pub use lifecycle::{LateRegistration, LifecyclePhase};
pub use pattern::{ALL_URLS, MatchPattern, matches};
