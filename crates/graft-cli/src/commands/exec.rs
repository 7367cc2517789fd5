//! `graft exec`: one ad-hoc execution.

use std::sync::Arc;

use anyhow::{Result, bail};
use graft_config::Config;
use graft_core::{DocumentUrl, ExtensionId, TargetId};
use graft_injector::{Coordinator, ExecuteScriptRequest, RuntimeCapabilityProvider};

use crate::config_bridge::to_injector_settings;

/// Target id the CLI uses as the request sender.
const CLI_TARGET: TargetId = TargetId(0);

pub(crate) fn run(
    config: &Config,
    extension: &str,
    url: &str,
    source: &str,
    code: &str,
) -> Result<()> {
    let extension_id = ExtensionId::new(extension)?;
    let url = DocumentUrl::parse(url)?;

    let mut coordinator = Coordinator::new(
        to_injector_settings(config),
        url,
        Arc::new(RuntimeCapabilityProvider),
    );
    let request = ExecuteScriptRequest::new(CLI_TARGET, extension_id, source, code);
    let response = coordinator.handle_ad_hoc(&request);

    println!("{}", serde_json::to_string_pretty(&response)?);
    if let Some(failure) = response.failure() {
        bail!("{} failed: {}", failure.source_id, failure.message);
    }
    Ok(())
}
