//! Per-club statistics collection
//!
//! Fetches every discovered club's statistics one request at a time,
//! separated by the configured rate-limit delay. A club whose fetch fails
//! after the client's retries — including a response missing the mandatory
//! `voucherCount` field — is logged and excluded; it never appears downstream
//! with zeroed values, and it never aborts the batch.

use crate::api::{self, ClubStatsResponse, ClubSummary};
use crate::config::ScraperConfig;
use crate::http::RetryingHttpClient;
use indicatif::ProgressBar;
use tracing::{info, warn};

/// How often to emit a progress log line
const PROGRESS_LOG_EVERY: usize = 100;

/// How many failed club names to include in the summary log
const FAILED_NAMES_SHOWN: usize = 10;

/// Collected statistics for one club
#[derive(Debug, Clone, PartialEq)]
pub struct ClubStats {
    pub public_id: String,
    pub name: String,
    pub voucher_count: u64,
    pub leaderboard_rank: Option<i64>,
    pub fan_count: Option<u64>,
    pub donation_sum: Option<f64>,
}

/// Result of a collection pass
#[derive(Debug)]
pub struct CollectionOutcome {
    /// Statistics for every club that succeeded, in input order
    pub stats: Vec<ClubStats>,

    /// Names of clubs whose fetch failed permanently
    pub failed: Vec<String>,
}

/// Sequential, rate-limited statistics fetcher
pub struct StatsCollector<'a> {
    client: &'a RetryingHttpClient,
    config: &'a ScraperConfig,
}

impl<'a> StatsCollector<'a> {
    pub fn new(client: &'a RetryingHttpClient, config: &'a ScraperConfig) -> Self {
        Self { client, config }
    }

    /// Fetch statistics for every club in `clubs`
    pub async fn collect(&self, clubs: &[ClubSummary]) -> CollectionOutcome {
        let total = clubs.len();
        let mut stats = Vec::with_capacity(total);
        let mut failed = Vec::new();

        info!(total, "Starting statistics collection");
        let progress = ProgressBar::new(total as u64);

        for (idx, club) in clubs.iter().enumerate() {
            let url = api::stats_url(&self.config.base_url, &club.public_id);

            match self.client.get_json::<ClubStatsResponse>(&url).await {
                Ok(response) => stats.push(ClubStats {
                    public_id: club.public_id.clone(),
                    name: club.name.clone(),
                    voucher_count: response.voucher_count,
                    leaderboard_rank: response.leaderboard_rank,
                    fan_count: response.fan_count,
                    donation_sum: response.donation_sum,
                }),
                Err(err) => {
                    warn!(club = %club.name, public_id = %club.public_id, error = %err, "Skipping club after failed stats fetch");
                    failed.push(club.name.clone());
                },
            }

            progress.inc(1);
            let done = idx + 1;
            if done % PROGRESS_LOG_EVERY == 0 || done == total {
                info!(
                    done,
                    total,
                    ok = stats.len(),
                    failed = failed.len(),
                    "Statistics collection progress"
                );
            }

            if done < total {
                tokio::time::sleep(self.config.rate_limit_delay).await;
            }
        }

        progress.finish_and_clear();

        if !failed.is_empty() {
            let shown = failed
                .iter()
                .take(FAILED_NAMES_SHOWN)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            let suffix = if failed.len() > FAILED_NAMES_SHOWN { ", ..." } else { "" };
            warn!(
                count = failed.len(),
                "Failed to fetch stats for clubs: {shown}{suffix}"
            );
        }
        info!(ok = stats.len(), total, "Statistics collection finished");

        CollectionOutcome { stats, failed }
    }
}
