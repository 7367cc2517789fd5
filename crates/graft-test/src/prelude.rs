//! Prelude module - commonly used test utilities.
//!
//! Use `use graft_test::prelude::*;` in test modules.

pub use crate::fixtures::{
    test_content_script, test_coordinator, test_document_url, test_extension_id, test_request,
};
pub use crate::harness::init_test_tracing;
pub use crate::mocks::RecordingCapabilityProvider;
