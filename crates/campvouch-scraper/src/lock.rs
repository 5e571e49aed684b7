//! Cooperative run lock
//!
//! Advisory, single-host mutual exclusion for the whole pipeline run: a file
//! whose presence means a run is in flight and whose modification time is the
//! staleness clock. A lock older than the configured timeout is presumed
//! abandoned by a crashed run and reclaimed. The file contains the owning
//! PID for operator inspection; nothing parses it back.

use crate::error::{Result, ScraperError};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// File-presence lock with a staleness timeout
#[derive(Debug, Clone)]
pub struct RunLock {
    path: PathBuf,
    timeout: Duration,
}

/// Held lock; releases on drop
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl RunLock {
    /// Create a lock handle (does not acquire)
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    /// Acquire the lock, reclaiming a stale one
    ///
    /// Fails with [`ScraperError::LockHeld`] when a lock younger than the
    /// timeout exists. A stale lock is removed with a warning and acquisition
    /// proceeds.
    pub fn acquire(&self) -> Result<LockGuard> {
        if self.path.exists() {
            let modified = std::fs::metadata(&self.path)?.modified()?;
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO);

            if age < self.timeout {
                return Err(ScraperError::LockHeld {
                    age_secs: age.as_secs_f64(),
                });
            }

            warn!(
                age_secs = age.as_secs(),
                timeout_secs = self.timeout.as_secs(),
                path = %self.path.display(),
                "Removing stale lock file"
            );
            std::fs::remove_file(&self.path)?;
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, std::process::id().to_string())?;
        info!(path = %self.path.display(), "Lock acquired");

        Ok(LockGuard {
            path: self.path.clone(),
            released: false,
        })
    }
}

impl LockGuard {
    /// Release the lock; idempotent, removes the file only if still present
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.path.exists() {
            if let Err(err) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %err, "Failed to remove lock file");
            } else {
                info!("Lock released");
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
