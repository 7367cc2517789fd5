//! Capability context handed to injected scripts.
//!
//! The injector does not implement the capability API. It asks a
//! [`CapabilityProvider`] for an opaque JSON object per execution and passes
//! it to the payload as its sole argument.

use graft_core::ExtensionId;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Opaque capability object passed to a payload as `chrome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityContext(Value);

impl CapabilityContext {
    /// Wrap a JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty object.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    /// Borrow the JSON form.
    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Take the JSON form.
    #[must_use]
    pub fn into_json(self) -> Value {
        self.0
    }
}

impl Default for CapabilityContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds the capability object for an extension.
pub trait CapabilityProvider: Send + Sync {
    /// Build the capability context for `extension_id`.
    ///
    /// `is_background` tells the provider whether the caller is the
    /// extension's background context.
    fn capability_context(&self, extension_id: &ExtensionId, is_background: bool)
    -> CapabilityContext;
}

/// Minimal provider exposing only `chrome.runtime.id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeCapabilityProvider;

impl CapabilityProvider for RuntimeCapabilityProvider {
    fn capability_context(
        &self,
        extension_id: &ExtensionId,
        _is_background: bool,
    ) -> CapabilityContext {
        CapabilityContext::new(json!({
            "runtime": { "id": extension_id.as_str() }
        }))
    }
}
