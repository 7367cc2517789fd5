//! Configuration types for the Graft injector.
//!
//! Every section implements [`Default`] so that a bare `[section]` header (or
//! no header at all) produces a working configuration.

use std::path::PathBuf;

use graft_core::{
    ContentScript, ExtensionDeclaration, ExtensionId, LateRegistration, Payload, RunAt,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Injector settings (the preference snapshot).
    pub injector: InjectorSection,
    /// The declaration feed, one entry per extension.
    #[serde(rename = "extension")]
    pub extensions: Vec<ExtensionSection>,
}

impl Config {
    /// Convert the `[[extension]]` tables into declaration-feed records.
    ///
    /// Must be called after file payloads have been resolved (the loader does
    /// this); a payload still lacking inline code is reported as invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an invalid extension id or
    /// an unresolved payload.
    pub fn declarations(&self) -> ConfigResult<Vec<ExtensionDeclaration>> {
        self.extensions
            .iter()
            .enumerate()
            .map(|(i, ext)| ext.to_declaration(&format!("extension[{i}]")))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["graft_injector=debug"]`).
    pub directives: Vec<String>,
    /// Write rolling log files into this directory instead of stderr.
    pub file_dir: Option<PathBuf>,
    /// Level for payload `console.*` output; unset inherits `level`.
    pub console_level: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "compact".into(),
            directives: Vec::new(),
            file_dir: None,
            console_level: None,
        }
    }
}

// ---------------------------------------------------------------------------
// InjectorSection
// ---------------------------------------------------------------------------

/// Settings the injector reads once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorSection {
    /// Whether this process is the background context. Passed to the
    /// capability provider for every execution.
    pub is_background: bool,
    /// Run one deferred-task tick right after the idle phase fires, so
    /// late idle registrations and pending stylesheets settle promptly.
    pub drain_ticks_on_idle: bool,
    /// Buffer size of the ad-hoc response broadcast channel.
    pub response_capacity: usize,
    /// `"reject"` drops start/end scripts declared after their phase fired;
    /// `"defer"` runs them on the next tick.
    pub late_registration: LateRegistration,
}

impl Default for InjectorSection {
    fn default() -> Self {
        Self {
            is_background: false,
            drain_ticks_on_idle: true,
            response_capacity: 256,
            late_registration: LateRegistration::Reject,
        }
    }
}

// ---------------------------------------------------------------------------
// Declaration feed
// ---------------------------------------------------------------------------

/// One extension and its declared content scripts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSection {
    /// Extension id.
    pub id: String,
    /// Declared content scripts, in manifest order.
    #[serde(rename = "content_script")]
    pub content_scripts: Vec<ContentScriptSection>,
}

impl ExtensionSection {
    fn to_declaration(&self, field: &str) -> ConfigResult<ExtensionDeclaration> {
        let extension_id =
            ExtensionId::new(self.id.as_str()).map_err(|e| ConfigError::ValidationError {
                field: format!("{field}.id"),
                message: e.to_string(),
            })?;

        let scripts = self
            .content_scripts
            .iter()
            .enumerate()
            .map(|(i, cs)| cs.to_content_script(&format!("{field}.content_script[{i}]")))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(ExtensionDeclaration::new(extension_id, scripts))
    }
}

/// A content-script table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentScriptSection {
    /// Match patterns.
    pub matches: Vec<String>,
    /// Timing phase.
    pub run_at: RunAt,
    /// Script payloads.
    pub js: Vec<PayloadSection>,
    /// Stylesheet payloads.
    pub css: Vec<PayloadSection>,
}

impl ContentScriptSection {
    fn to_content_script(&self, field: &str) -> ConfigResult<ContentScript> {
        let js = resolved_payloads(&self.js, &format!("{field}.js"))?;
        let css = resolved_payloads(&self.css, &format!("{field}.css"))?;
        Ok(ContentScript {
            matches: self.matches.clone(),
            js,
            css,
            run_at: self.run_at,
        })
    }
}

fn resolved_payloads(payloads: &[PayloadSection], field: &str) -> ConfigResult<Vec<Payload>> {
    payloads
        .iter()
        .enumerate()
        .map(|(i, p)| {
            p.code
                .as_ref()
                .map(|code| Payload::new(p.source.as_str(), code.as_str()))
                .ok_or_else(|| ConfigError::ValidationError {
                    field: format!("{field}[{i}]"),
                    message: "payload has no code; file references must be resolved first".into(),
                })
        })
        .collect()
}

/// A payload given either inline (`code`) or as a file reference (`file`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadSection {
    /// Label used in logs and as the script's debug name.
    pub source: String,
    /// Inline code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// File to read the code from, relative to the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "compact");
        assert!(!config.injector.is_background);
        assert!(config.injector.drain_ticks_on_idle);
        assert_eq!(config.injector.response_capacity, 256);
        assert_eq!(config.injector.late_registration, LateRegistration::Reject);
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_late_registration_policy() {
        let config: Config = toml::from_str("[injector]\nlate_registration = \"defer\"\n").unwrap();
        assert_eq!(config.injector.late_registration, LateRegistration::Defer);
        assert!(toml::from_str::<Config>("[injector]\nlate_registration = \"later\"\n").is_err());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_extension_tables_deserialize() {
        let config: Config = toml::from_str(
            r#"
            [[extension]]
            id = "ext1"

            [[extension.content_script]]
            matches = ["https://*.example.com/*"]
            run_at = "document_start"
            js = [{ source = "a.js", code = "1" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.extensions.len(), 1);
        let cs = &config.extensions[0].content_scripts[0];
        assert_eq!(cs.run_at, RunAt::DocumentStart);
        assert_eq!(cs.js[0].code.as_deref(), Some("1"));
        assert!(cs.css.is_empty());
    }

    #[test]
    fn test_declarations_conversion() {
        let config: Config = toml::from_str(
            r#"
            [[extension]]
            id = "ext1"
            [[extension.content_script]]
            matches = ["<all_urls>"]
            css = [{ source = "s.css", code = "p {}" }]
            "#,
        )
        .unwrap();

        let feed = config.declarations().unwrap();
        assert_eq!(feed[0].extension_id.as_str(), "ext1");
        let script = &feed[0].content_scripts[0];
        assert_eq!(script.run_at, RunAt::DocumentIdle);
        assert_eq!(script.css, vec![Payload::new("s.css", "p {}")]);
    }

    #[test]
    fn test_declarations_reject_bad_extension_id() {
        let config = Config {
            extensions: vec![ExtensionSection {
                id: "has space".into(),
                content_scripts: Vec::new(),
            }],
            ..Config::default()
        };
        let err = config.declarations().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "extension[0].id")
        );
    }

    #[test]
    fn test_declarations_reject_unresolved_file() {
        let config = Config {
            extensions: vec![ExtensionSection {
                id: "ext1".into(),
                content_scripts: vec![ContentScriptSection {
                    matches: vec!["<all_urls>".into()],
                    js: vec![PayloadSection {
                        source: "a.js".into(),
                        code: None,
                        file: Some("a.js".into()),
                    }],
                    ..ContentScriptSection::default()
                }],
            }],
            ..Config::default()
        };
        assert!(config.declarations().is_err());
    }
}
