//! Subcommand implementations.

pub(crate) mod exec;
pub(crate) mod inject;
pub(crate) mod validate;

use anyhow::{Result, bail};
use graft_config::Config;

/// Unwrap a loaded config, or explain that `command` needs one.
pub(crate) fn require_config(config: Option<Config>, command: &str) -> Result<Config> {
    match config {
        Some(config) => Ok(config),
        None => bail!("`graft {command}` requires --config <FILE> (or GRAFT_CONFIG)"),
    }
}
