//! Configuration for the scraper pipeline
//!
//! All tunables live in one value passed into each component's constructor;
//! nothing reads global state after startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Reference Configuration Constants
// ============================================================================

/// Default upstream API base URL.
pub const DEFAULT_BASE_URL: &str = "https://supportmycamp.migros.ch/api/v1/frontend";

/// Default page size for the club search endpoint.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default delay between consecutive upstream requests.
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 20;

/// Default number of attempts per HTTP fetch.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default backoff schedule in milliseconds, indexed by attempt.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 3] = [100, 200, 400];

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Age after which an existing lock file is presumed abandoned.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 600;

/// Total prize pool distributed across all vouchers, in CHF.
pub const DEFAULT_PRIZE_POOL: f64 = 3_000_000.0;

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Upstream API base URL
    pub base_url: String,

    /// Directory for published snapshots and the lock file
    pub data_dir: PathBuf,

    /// Page size requested from the search endpoint
    pub page_size: u32,

    /// Delay between consecutive upstream requests
    pub rate_limit_delay: Duration,

    /// Attempts per HTTP fetch before giving up
    pub retry_attempts: u32,

    /// Backoff delays indexed by attempt; the last value repeats
    pub retry_delays: Vec<Duration>,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Lock staleness timeout
    pub lock_timeout: Duration,

    /// Total prize pool in CHF
    pub prize_pool: f64,

    /// Tier-1 enumeration orderings; `None` is the API's default ordering
    pub orderings: Vec<Option<String>>,

    /// Tier-2 category partitions (camp age groups)
    pub partitions: Vec<String>,

    /// Orderings tried within each partition
    pub partition_orderings: Vec<Option<String>>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from("data"),
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit_delay: Duration::from_millis(DEFAULT_RATE_LIMIT_DELAY_MS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delays: DEFAULT_RETRY_DELAYS_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            lock_timeout: Duration::from_secs(DEFAULT_LOCK_TIMEOUT_SECS),
            prize_pool: DEFAULT_PRIZE_POOL,
            orderings: vec![
                None,
                Some("voucher_count".to_string()),
                Some("-voucher_count".to_string()),
                Some("member_count".to_string()),
                Some("-member_count".to_string()),
                Some("name".to_string()),
                Some("-name".to_string()),
            ],
            partitions: vec![
                "0_5".to_string(),
                "6_11".to_string(),
                "12_15".to_string(),
                "16_99".to_string(),
            ],
            partition_orderings: vec![
                None,
                Some("voucher_count".to_string()),
                Some("-voucher_count".to_string()),
            ],
        }
    }
}

impl ScraperConfig {
    /// Create a config with the reference defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `CAMPVOUCH_BASE_URL`: upstream API base URL
    /// - `CAMPVOUCH_DATA_DIR`: output directory
    /// - `CAMPVOUCH_PRIZE_POOL`: prize pool in CHF
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CAMPVOUCH_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(dir) = std::env::var("CAMPVOUCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(pool) = std::env::var("CAMPVOUCH_PRIZE_POOL") {
            config.prize_pool = pool
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid CAMPVOUCH_PRIZE_POOL: {}", pool))?;
        }

        Ok(config)
    }

    /// Path of the lock file guarding concurrent runs
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(".scraper.lock")
    }
}
