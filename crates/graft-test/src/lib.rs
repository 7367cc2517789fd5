//! Graft Test - Shared test utilities for the Graft injector.
//!
//! This crate provides fixtures, a recording capability provider, and a
//! tracing harness that can be used across Graft crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! graft-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use graft_test::{RecordingCapabilityProvider, test_coordinator, test_request};
//!
//! let provider = RecordingCapabilityProvider::new();
//! let mut coordinator = test_coordinator("https://a.test/page", provider.clone());
//! let response = coordinator.handle_ad_hoc(&test_request("return 1"));
//! assert_eq!(provider.calls().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
