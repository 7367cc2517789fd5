//! The URL of the document payloads are injected into.

use std::fmt;

use url::Url;

use crate::error::{CoreError, CoreResult};

/// A parsed document URL.
///
/// Match patterns are evaluated against [`DocumentUrl::match_target`], which is
/// `scheme://host/path` with the query string and fragment dropped. Two URLs
/// that differ only in query or fragment therefore match identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUrl {
    url: Url,
    match_target: String,
}

impl DocumentUrl {
    /// Parse a document URL.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUrl`] if the text is not an absolute URL.
    pub fn parse(href: &str) -> CoreResult<Self> {
        let url = Url::parse(href).map_err(|source| CoreError::InvalidUrl {
            url: href.to_string(),
            source,
        })?;
        Ok(Self::from_url(url))
    }

    /// Wrap an already parsed URL.
    #[must_use]
    pub fn from_url(url: Url) -> Self {
        let match_target = format!("{}://{}{}", url.scheme(), host_with_port(&url), url.path());
        Self { url, match_target }
    }

    /// The `scheme://host/path` form used for pattern matching.
    #[must_use]
    pub fn match_target(&self) -> &str {
        &self.match_target
    }

    /// The full URL, including query and fragment.
    #[must_use]
    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    /// Scheme followed by a colon, as `location.protocol` reports it.
    #[must_use]
    pub fn protocol(&self) -> String {
        format!("{}:", self.url.scheme())
    }

    /// Host and non-default port, as `location.host` reports it.
    #[must_use]
    pub fn host(&self) -> String {
        host_with_port(&self.url)
    }

    /// Host without port.
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Path component.
    #[must_use]
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Query string including the leading `?`, or empty.
    #[must_use]
    pub fn search(&self) -> String {
        self.url.query().map(|q| format!("?{q}")).unwrap_or_default()
    }

    /// Fragment including the leading `#`, or empty.
    #[must_use]
    pub fn hash(&self) -> String {
        self.url
            .fragment()
            .map(|f| format!("#{f}"))
            .unwrap_or_default()
    }

    /// The underlying parsed URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

impl fmt::Display for DocumentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
