//! Mock implementations for testing.

use std::sync::{Arc, Mutex};

use graft_core::ExtensionId;
use graft_injector::{CapabilityContext, CapabilityProvider};
use serde_json::{Value, json};

/// A capability provider that records every call.
///
/// Clones share the same call log, so a test can keep one handle while the
/// coordinator owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingCapabilityProvider {
    calls: Arc<Mutex<Vec<(ExtensionId, bool)>>>,
    extra: Option<Value>,
}

impl RecordingCapabilityProvider {
    /// Create a provider that returns `{ "runtime": { "id": <extension> } }`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `extra` into every returned capability object under `"extra"`.
    #[must_use]
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Every `(extension id, is_background)` pair seen so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<(ExtensionId, bool)> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Number of calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }
}

impl CapabilityProvider for RecordingCapabilityProvider {
    fn capability_context(
        &self,
        extension_id: &ExtensionId,
        is_background: bool,
    ) -> CapabilityContext {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push((extension_id.clone(), is_background));

        let mut value = json!({ "runtime": { "id": extension_id.as_str() } });
        if let (Some(extra), Some(map)) = (&self.extra, value.as_object_mut()) {
            map.insert("extra".into(), extra.clone());
        }
        CapabilityContext::new(value)
    }
}
