//! Core error types.

use thiserror::Error;

/// Errors raised while building core values (identifiers, URLs).
#[derive(Debug, Error)]
pub enum CoreError {
    /// An extension identifier failed validation.
    #[error("invalid extension id {id:?}: {reason}")]
    InvalidExtensionId {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A document URL could not be parsed.
    #[error("invalid document url {url:?}: {source}")]
    InvalidUrl {
        /// The rejected URL text.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A match pattern that could not be compiled.
///
/// Malformed patterns never match; callers log this error and move on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid match pattern {pattern:?}: {reason}")]
pub struct PatternError {
    /// The pattern as declared.
    pub pattern: String,
    /// Why compilation failed.
    pub reason: String,
}
