//! Host-side model of the document payloads are injected into.

use graft_core::{DocumentUrl, LifecyclePhase};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A `<style>` element appended by a stylesheet payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleElement {
    /// Source identifier of the stylesheet payload.
    pub source_id: String,
    /// The literal stylesheet text.
    pub text: String,
}

/// The document for one document context.
///
/// Stylesheets need an existing head, so they are held in a pending list until
/// the DOM is ready and only then appended.
#[derive(Debug, Clone)]
pub struct Document {
    url: DocumentUrl,
    phase: Option<LifecyclePhase>,
    head: Vec<StyleElement>,
    pending_styles: Vec<StyleElement>,
}

impl Document {
    /// Create a document that has not started loading.
    #[must_use]
    pub fn new(url: DocumentUrl) -> Self {
        Self {
            url,
            phase: None,
            head: Vec::new(),
            pending_styles: Vec::new(),
        }
    }

    /// The document URL.
    #[must_use]
    pub fn url(&self) -> &DocumentUrl {
        &self.url
    }

    /// The last lifecycle phase the document reached.
    #[must_use]
    pub fn phase(&self) -> Option<LifecyclePhase> {
        self.phase
    }

    /// `document.readyState`.
    #[must_use]
    pub fn ready_state(&self) -> &'static str {
        self.phase.map_or("loading", LifecyclePhase::ready_state)
    }

    /// Whether DOM content has loaded.
    #[must_use]
    pub fn is_dom_ready(&self) -> bool {
        self.phase == Some(LifecyclePhase::Idle)
    }

    pub(crate) fn enter(&mut self, phase: LifecyclePhase) {
        self.phase = Some(phase);
    }

    pub(crate) fn queue_style(&mut self, style: StyleElement) {
        self.pending_styles.push(style);
    }

    /// Append pending styles to the head if the DOM is ready.
    ///
    /// Returns the number of styles appended.
    pub(crate) fn flush_styles(&mut self) -> usize {
        if !self.is_dom_ready() || self.pending_styles.is_empty() {
            return 0;
        }
        let count = self.pending_styles.len();
        for style in &self.pending_styles {
            debug!(source = %style.source_id, bytes = style.text.len(), "Appending style element");
        }
        self.head.append(&mut self.pending_styles);
        count
    }

    /// Style elements appended to the head, in append order.
    #[must_use]
    pub fn styles(&self) -> &[StyleElement] {
        &self.head
    }

    /// Styles waiting for the DOM to become ready.
    #[must_use]
    pub fn pending_styles(&self) -> &[StyleElement] {
        &self.pending_styles
    }
}
