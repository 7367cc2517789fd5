#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the Graft injector.
//!
//! A single TOML file replaces the process-wide preference snapshot the
//! injector would otherwise read at startup. It carries logging settings,
//! injector settings, and the declaration feed itself:
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//! console_level = "debug"
//!
//! [injector]
//! drain_ticks_on_idle = true
//! late_registration = "reject"
//!
//! [[extension]]
//! id = "ext1"
//!
//! [[extension.content_script]]
//! matches = ["https://*.example.com/*"]
//! run_at = "document_end"
//! js = [{ source = "content.js", file = "content.js" }]
//! css = [{ source = "inline.css", code = "body { color: red }" }]
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use graft_config::Config;
//!
//! let config = Config::load_file(std::path::Path::new("graft.toml")).unwrap();
//! let feed = config.declarations().unwrap();
//! println!("{} extensions declared", feed.len());
//! ```
//!
//! Payload `file` entries are read relative to the config file's directory at
//! load time; after loading, every payload carries its code inline.
//! `GRAFT_LOG_LEVEL` and `GRAFT_LOG_FORMAT` override the `[logging]` section.

/// Configuration error types.
pub mod error;
/// Configuration file loading and environment overrides.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load, resolve, override, and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file or a referenced payload file
    /// cannot be read, the TOML is malformed, or validation fails.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse and validate config text; payload `file` entries resolve
    /// against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is malformed or invalid.
    pub fn from_toml_str(text: &str, base_dir: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load_str(text, base_dir)
    }
}
