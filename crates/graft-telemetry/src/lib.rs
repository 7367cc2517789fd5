//! Graft Telemetry - Logging and request tracing for the Graft injector.
//!
//! This crate provides:
//! - Configurable `tracing-subscriber` setup (pretty, compact, JSON, full)
//! - Stderr or rolling-file output, with payload console output filtered
//!   under its own target
//! - Execution contexts that tag each payload run with its extension, source,
//!   and trigger (lifecycle phase or request correlation id)
//!
//! # Example
//!
//! ```rust,no_run
//! use graft_telemetry::{ExecutionContext, ExecutionGuard, LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), graft_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("graft_injector=debug");
//!
//! setup_logging(&config)?;
//!
//! let mut guard = ExecutionGuard::new(ExecutionContext::lifecycle("ext1", "content.js", "idle"));
//! tracing::info!("Running payload");
//! guard.record(true);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{ExecutionContext, ExecutionGuard, Trigger};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    CONSOLE_TARGET, FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget,
    setup_default_logging, setup_logging,
};
