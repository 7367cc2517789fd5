//! Content-script declarations.
//!
//! Declarations are owned by extension manifests and arrive through the
//! declaration feed when a document context is created. They are read-only
//! at injection time.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document_url::DocumentUrl;
use crate::ids::ExtensionId;
use crate::lifecycle::LifecyclePhase;
use crate::pattern::MatchPattern;

/// When a content script runs relative to document construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAt {
    /// Before DOM construction completes.
    DocumentStart,
    /// After DOM construction, before the full load.
    DocumentEnd,
    /// Once the document is fully parsed.
    #[default]
    DocumentIdle,
}

impl RunAt {
    /// The lifecycle phase this timing is bound to.
    #[must_use]
    pub fn phase(self) -> LifecyclePhase {
        match self {
            Self::DocumentStart => LifecyclePhase::Start,
            Self::DocumentEnd => LifecyclePhase::End,
            Self::DocumentIdle => LifecyclePhase::Idle,
        }
    }

    /// Manifest spelling of this timing.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DocumentStart => "document_start",
            Self::DocumentEnd => "document_end",
            Self::DocumentIdle => "document_idle",
        }
    }
}

/// A script or stylesheet body.
///
/// `source` is a label used for tracing and as the script's debug name. It is
/// never resolved against a filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Source identifier (typically the manifest-relative file name).
    pub source: String,
    /// The code text.
    pub code: String,
}

impl Payload {
    /// Create a payload.
    #[must_use]
    pub fn new(source: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            code: code.into(),
        }
    }
}

/// A declared bundle of scripts and stylesheets with its match patterns and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentScript {
    /// Match patterns; the script applies if any of them matches.
    pub matches: Vec<String>,
    /// Script payloads, in injection order.
    #[serde(default)]
    pub js: Vec<Payload>,
    /// Stylesheet payloads, in injection order.
    #[serde(default)]
    pub css: Vec<Payload>,
    /// Timing phase.
    #[serde(default)]
    pub run_at: RunAt,
}

impl ContentScript {
    /// Create a content script with the given patterns and no payloads.
    #[must_use]
    pub fn new<I, S>(matches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matches: matches.into_iter().map(Into::into).collect(),
            js: Vec::new(),
            css: Vec::new(),
            run_at: RunAt::default(),
        }
    }

    /// Append a script payload.
    #[must_use]
    pub fn with_js(mut self, source: impl Into<String>, code: impl Into<String>) -> Self {
        self.js.push(Payload::new(source, code));
        self
    }

    /// Append a stylesheet payload.
    #[must_use]
    pub fn with_css(mut self, source: impl Into<String>, code: impl Into<String>) -> Self {
        self.css.push(Payload::new(source, code));
        self
    }

    /// Set the timing phase.
    #[must_use]
    pub fn with_run_at(mut self, run_at: RunAt) -> Self {
        self.run_at = run_at;
        self
    }

    /// Compile the declared patterns, dropping (and logging) malformed ones.
    #[must_use]
    pub fn compiled_patterns(&self) -> Vec<MatchPattern> {
        self.matches
            .iter()
            .filter_map(|p| match MatchPattern::new(p.as_str()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "Ignoring malformed match pattern");
                    None
                },
            })
            .collect()
    }

    /// Check whether any declared pattern matches the document.
    #[must_use]
    pub fn applies_to(&self, url: &DocumentUrl) -> bool {
        let matched = self.compiled_patterns().iter().any(|p| p.matches(url));
        if !matched {
            debug!(
                url = %url.match_target(),
                patterns = ?self.matches,
                "Content script does not match document"
            );
        }
        matched
    }

    /// Whether the script declares no payloads at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.is_empty()
    }
}

/// One record of the declaration feed: an extension and its content scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDeclaration {
    /// The declaring extension.
    pub extension_id: ExtensionId,
    /// Declared content scripts, in manifest order.
    #[serde(default)]
    pub content_scripts: Vec<ContentScript>,
}

impl ExtensionDeclaration {
    /// Create a declaration.
    #[must_use]
    pub fn new(extension_id: ExtensionId, content_scripts: Vec<ContentScript>) -> Self {
        Self {
            extension_id,
            content_scripts,
        }
    }
}
