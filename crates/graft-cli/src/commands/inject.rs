//! `graft inject`: drive a document lifecycle over the configured feed.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use graft_config::Config;
use graft_core::{DocumentUrl, LifecyclePhase};
use graft_injector::{Coordinator, HostMessage, RuntimeCapabilityProvider};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

use crate::config_bridge::to_injector_settings;

pub(crate) fn parse_until(until: &str) -> Result<LifecyclePhase> {
    match until.to_ascii_lowercase().as_str() {
        "start" | "document_start" => Ok(LifecyclePhase::Start),
        "end" | "document_end" => Ok(LifecyclePhase::End),
        "idle" | "document_idle" => Ok(LifecyclePhase::Idle),
        other => bail!("unknown lifecycle phase {other:?}; expected start, end, or idle"),
    }
}

pub(crate) async fn run(config: &Config, url: &str, until: &str) -> Result<()> {
    let last = parse_until(until)?;
    let url = DocumentUrl::parse(url)?;
    let declarations = config
        .declarations()
        .context("failed to build declaration feed")?;

    let mut coordinator = Coordinator::with_declarations(
        to_injector_settings(config),
        url.clone(),
        Arc::new(RuntimeCapabilityProvider),
        &declarations,
    );

    let phases: Vec<LifecyclePhase> = LifecyclePhase::ALL
        .into_iter()
        .filter(|phase| *phase <= last)
        .collect();
    let (tx, rx) = mpsc::channel(phases.len().max(1));
    for phase in phases {
        tx.send(HostMessage::Lifecycle { phase }).await?;
    }
    drop(tx);
    coordinator.run(rx).await;

    let report = coordinator.report();
    info!(?report, "Injection finished");

    let output = json!({
        "url": url.href(),
        "ready_state": coordinator.document().ready_state(),
        "report": report,
        "styles": coordinator.document().styles(),
        "pending_styles": coordinator.document().pending_styles().len(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_until_accepts_both_spellings() {
        assert_eq!(parse_until("start").unwrap(), LifecyclePhase::Start);
        assert_eq!(parse_until("document_end").unwrap(), LifecyclePhase::End);
        assert_eq!(parse_until("IDLE").unwrap(), LifecyclePhase::Idle);
        assert!(parse_until("load").is_err());
    }
}
