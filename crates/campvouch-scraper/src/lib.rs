//! CampVouch Scraper Library
//!
//! The discovery-and-collection engine behind the CampVouch snapshots.
//!
//! A run is a sequential pipeline guarded by an advisory file lock:
//!
//! 1. **Enumerate** every participating club. The upstream search endpoint is
//!    cursor-paginated but caps how far any single query will paginate, so a
//!    single walk never yields the full set; the enumerator walks the listing
//!    under multiple sort orderings and category partitions and merges the
//!    results until the API's reported total is reached.
//! 2. **Collect** per-club voucher statistics, one request at a time with a
//!    rate-limit delay, skipping clubs whose fetch fails after retries.
//! 3. **Aggregate** the uniform per-voucher worth from the fixed prize pool
//!    and each club's estimated payout.
//! 4. **Publish** the result as a timestamped JSON snapshot and mirror it to
//!    `latest.json` for polling consumers.
//!
//! # Example
//!
//! ```no_run
//! use campvouch_scraper::{config::ScraperConfig, pipeline::Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScraperConfig::from_env()?;
//!     let snapshot = Pipeline::new(config).run().await?;
//!     println!("published {} clubs", snapshot.metadata.total_clubs);
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod api;
pub mod collect;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod http;
pub mod lock;
pub mod pipeline;
pub mod publish;

// Re-export commonly used types
pub use error::{Result, ScraperError};
