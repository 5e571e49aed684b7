//! Run orchestration
//!
//! Drives one full scraper run through its states: acquire the lock,
//! enumerate, collect, aggregate, publish, release. The lock guard releases
//! on every exit path; a run that fails after acquisition writes no snapshot
//! and leaves the previous `latest.json` untouched.

use crate::aggregate::PayoutAggregator;
use crate::collect::StatsCollector;
use crate::config::ScraperConfig;
use crate::enumerate::Enumerator;
use crate::error::{Result, ScraperError};
use crate::http::RetryingHttpClient;
use crate::lock::RunLock;
use crate::publish::SnapshotPublisher;
use campvouch_common::snapshot::Snapshot;
use std::time::Instant;
use tracing::{debug, info};

/// States of a scraper run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Init,
    LockAcquired,
    Enumerating,
    Collecting,
    Aggregating,
    Publishing,
    Done,
}

fn advance(state: &mut RunState, next: RunState) {
    debug!(from = ?state, to = ?next, "Run state");
    *state = next;
}

/// One complete discovery-and-collection run
pub struct Pipeline {
    config: ScraperConfig,
}

impl Pipeline {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Execute the full run and return the published snapshot.
    ///
    /// Fails fast with [`ScraperError::LockHeld`] when another run is in
    /// flight — nothing is fetched or written in that case. After the lock
    /// is held, a run is fatal only when enumeration finds no clubs or
    /// collection yields no records; either way the lock is released and no
    /// snapshot is written.
    pub async fn run(&self) -> Result<Snapshot> {
        let started = Instant::now();
        let mut state = RunState::Init;
        info!("Starting scraper run");

        let lock = RunLock::new(self.config.lock_path(), self.config.lock_timeout);
        let _guard = lock.acquire()?;
        advance(&mut state, RunState::LockAcquired);

        let client = RetryingHttpClient::new(&self.config)?;

        advance(&mut state, RunState::Enumerating);
        let clubs = Enumerator::new(&client, &self.config).enumerate().await;
        if clubs.is_empty() {
            return Err(ScraperError::NoClubs);
        }

        advance(&mut state, RunState::Collecting);
        let outcome = StatsCollector::new(&client, &self.config)
            .collect(&clubs)
            .await;
        if outcome.stats.is_empty() {
            return Err(ScraperError::NoStats {
                attempted: clubs.len(),
            });
        }

        advance(&mut state, RunState::Aggregating);
        let snapshot = PayoutAggregator::new(self.config.prize_pool).aggregate(outcome.stats);

        advance(&mut state, RunState::Publishing);
        let path = SnapshotPublisher::new(&self.config.data_dir).publish(&snapshot)?;

        advance(&mut state, RunState::Done);
        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            total_clubs = snapshot.metadata.total_clubs,
            total_vouchers = snapshot.metadata.total_vouchers,
            voucher_worth = snapshot.metadata.voucher_worth,
            path = %path.display(),
            "Scraper run completed"
        );

        Ok(snapshot)
    }
}
