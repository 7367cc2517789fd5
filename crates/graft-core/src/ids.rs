//! Identifiers shared between the host and the injector.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Stable identifier of the extension that declared a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExtensionId(String);

impl<'de> Deserialize<'de> for ExtensionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl ExtensionId {
    /// Create a validated extension id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidExtensionId`] if the id is empty or contains
    /// whitespace or control characters.
    pub fn new(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> CoreResult<()> {
        if id.is_empty() {
            return Err(CoreError::InvalidExtensionId {
                id: id.to_string(),
                reason: "extension id must not be empty".into(),
            });
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CoreError::InvalidExtensionId {
                id: id.to_string(),
                reason: "extension id must not contain whitespace or control characters".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtensionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of the host target (tab, frame, web contents) that sent a request.
///
/// The response to an ad-hoc request is addressed back to this target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target:{}", self.0)
    }
}

/// Correlation id of a single ad-hoc execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a request id from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_id_rejects_empty() {
        assert!(ExtensionId::new("").is_err());
    }

    #[test]
    fn extension_id_rejects_whitespace() {
        assert!(ExtensionId::new("my ext").is_err());
        assert!(ExtensionId::new("ext\n").is_err());
    }

    #[test]
    fn extension_id_accepts_chrome_style_ids() {
        let id = ExtensionId::new("aapocclcgogkmnckokdopfmhonfmgoek").unwrap();
        assert_eq!(id.as_str(), "aapocclcgogkmnckokdopfmhonfmgoek");
        assert_eq!(id.to_string(), "aapocclcgogkmnckokdopfmhonfmgoek");
    }

    #[test]
    fn extension_id_deserialize_validates() {
        let ok: Result<ExtensionId, _> = serde_json::from_str("\"ext1\"");
        assert!(ok.is_ok());

        let bad: Result<ExtensionId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn display_prefixes() {
        assert_eq!(TargetId(7).to_string(), "target:7");
        let uuid = Uuid::nil();
        assert_eq!(
            RequestId::from_uuid(uuid).to_string(),
            format!("request:{uuid}")
        );
    }
}
