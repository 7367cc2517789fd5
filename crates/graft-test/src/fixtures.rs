//! Test fixtures for common types.

use std::sync::Arc;

use graft_core::{ContentScript, DocumentUrl, ExtensionId, RunAt, TargetId};
use graft_injector::{
    CapabilityProvider, Coordinator, ExecuteScriptRequest, InjectorSettings,
};

/// Extension id used by fixtures that do not take one.
pub const TEST_EXTENSION: &str = "test-extension";

/// Target id used by [`test_request`].
pub const TEST_TARGET: TargetId = TargetId(1);

/// Create the fixture extension id.
#[must_use]
pub fn test_extension_id() -> ExtensionId {
    extension_id(TEST_EXTENSION)
}

/// Create an extension id, panicking if it is invalid.
///
/// # Panics
///
/// Panics if `id` is not a valid extension id.
#[must_use]
pub fn extension_id(id: &str) -> ExtensionId {
    ExtensionId::new(id).expect("invalid test extension id")
}

/// Parse a document URL, panicking if it is invalid.
///
/// # Panics
///
/// Panics if `href` does not parse.
#[must_use]
pub fn test_document_url(href: &str) -> DocumentUrl {
    DocumentUrl::parse(href).expect("invalid test document url")
}

/// A content script with one pattern, one script payload, and a timing.
#[must_use]
pub fn test_content_script(pattern: &str, run_at: RunAt, code: &str) -> ContentScript {
    ContentScript::new([pattern])
        .with_run_at(run_at)
        .with_js(format!("{}.js", run_at.as_str()), code)
}

/// An ad-hoc request from [`TEST_TARGET`] for [`TEST_EXTENSION`].
#[must_use]
pub fn test_request(code: &str) -> ExecuteScriptRequest {
    ExecuteScriptRequest::new(TEST_TARGET, test_extension_id(), "adhoc.js", code)
}

/// A coordinator with default settings for the document at `href`.
///
/// # Panics
///
/// Panics if `href` does not parse.
#[must_use]
pub fn test_coordinator<P>(href: &str, provider: P) -> Coordinator
where
    P: CapabilityProvider + 'static,
{
    Coordinator::new(
        InjectorSettings::default(),
        test_document_url(href),
        Arc::new(provider),
    )
}
