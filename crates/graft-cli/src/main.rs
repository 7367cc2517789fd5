//! Graft CLI - run content-script injection against a document.
//!
//! `graft inject` loads a declaration feed from a config file and drives a
//! full document lifecycle; `graft exec` performs one ad-hoc execution.
//! Both print JSON to stdout; logs go to stderr (or rolling files).

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;

/// Graft - content-script injection scheduler
#[derive(Parser)]
#[command(name = "graft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "GRAFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inject the configured content scripts into a document
    Inject {
        /// Document URL
        #[arg(short, long)]
        url: String,

        /// Stop after this lifecycle phase (start, end, idle)
        #[arg(long, default_value = "idle")]
        until: String,
    },

    /// Execute code on demand, outside the document lifecycle
    Exec {
        /// Extension the code runs as
        #[arg(short, long)]
        extension: String,

        /// Document URL
        #[arg(short, long)]
        url: String,

        /// Code to run (the body of a function; use `return` for a result)
        #[arg(long)]
        code: String,

        /// Source identifier used in diagnostics
        #[arg(long, default_value = "exec.js")]
        source: String,
    },

    /// Validate the configuration file and list declared extensions
    Validate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Some(graft_config::Config::load_file(path)?),
        None => None,
    };

    // Set up logging from config, with --verbose override.
    let log_config = if let Some(cfg) = &config {
        let mut lc = config_bridge::to_log_config(cfg);
        if cli.verbose {
            lc.level = "debug".to_string();
        }
        lc
    } else {
        let level = if cli.verbose { "debug" } else { "warn" };
        graft_telemetry::LogConfig::new(level).with_format(graft_telemetry::LogFormat::Compact)
    };
    if let Err(e) = graft_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Inject { url, until } => {
            let config = commands::require_config(config, "inject")?;
            commands::inject::run(&config, &url, &until).await?;
        },
        Commands::Exec {
            extension,
            url,
            code,
            source,
        } => {
            let config = config.unwrap_or_default();
            commands::exec::run(&config, &extension, &url, &source, &code)?;
        },
        Commands::Validate => {
            let config = commands::require_config(config, "validate")?;
            commands::validate::run(&config)?;
        },
    }

    Ok(())
}
