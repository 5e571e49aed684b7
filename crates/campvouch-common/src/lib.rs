//! CampVouch Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and utilities for the CampVouch project.
//!
//! # Overview
//!
//! This crate provides the pieces shared between the scraper and the
//! downstream consumers of its published artifacts:
//!
//! - **Snapshot model**: the published JSON artifact format (metadata plus
//!   per-club records) that the dashboard and forecasting job read
//! - **Logging**: tracing subscriber configuration and initialization
//! - **Error Handling**: common error and result types
//!
//! # Example
//!
//! ```no_run
//! use campvouch_common::snapshot::Snapshot;
//!
//! fn newest_totals(path: &str) -> campvouch_common::Result<u64> {
//!     let snapshot = Snapshot::load(path)?;
//!     Ok(snapshot.metadata.total_vouchers)
//! }
//! ```

pub mod error;
pub mod logging;
pub mod snapshot;

// Re-export commonly used types
pub use error::{CommonError, Result};
