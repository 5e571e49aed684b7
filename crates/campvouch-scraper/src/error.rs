//! Error types for the scraper pipeline
//!
//! Page- and club-level fetch failures are values ([`crate::http::FetchError`])
//! that the enumerator and collector absorb; the variants here are the
//! conditions that end a run.

use thiserror::Error;

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Fatal conditions for a scraper run
#[derive(Error, Debug)]
pub enum ScraperError {
    /// Another run holds the lock; nothing has been fetched or written yet.
    #[error("Another scraper instance is running (lock age: {age_secs:.1}s). Wait for it to finish, or remove the lock file if you know the process is dead.")]
    LockHeld { age_secs: f64 },

    /// Enumeration produced an empty identity set.
    #[error("No clubs discovered. The search endpoint may be down or its response format may have changed.")]
    NoClubs,

    /// Every per-club stats fetch failed.
    #[error("Statistics collection succeeded for 0 of {attempted} clubs. The stats endpoint may be down or its response format may have changed.")]
    NoStats { attempted: usize },

    /// HTTP client construction failed
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization failed
    #[error("Failed to serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
