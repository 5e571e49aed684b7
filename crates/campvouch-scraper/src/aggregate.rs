//! Payout aggregation
//!
//! Derives the uniform per-voucher worth from the fixed prize pool and the
//! collected voucher counts, then computes every club's estimated payout.
//! Worth and payouts are rounded to centimes with standard half-away-from-zero
//! rounding; the zero-voucher case yields a worth of 0 rather than a division
//! by zero.

use crate::collect::ClubStats;
use campvouch_common::snapshot::{round2, ClubRecord, RunMetadata, Snapshot};
use chrono::Utc;
use tracing::{info, warn};

/// Turns collected statistics into a publishable snapshot
pub struct PayoutAggregator {
    prize_pool: f64,
}

impl PayoutAggregator {
    pub fn new(prize_pool: f64) -> Self {
        Self { prize_pool }
    }

    /// Aggregate collected statistics into a snapshot stamped with the
    /// current wall-clock time
    pub fn aggregate(&self, stats: Vec<ClubStats>) -> Snapshot {
        let total_clubs = stats.len();
        let total_vouchers: u64 = stats.iter().map(|club| club.voucher_count).sum();

        let voucher_worth = if total_vouchers == 0 {
            warn!("Total vouchers is 0, voucher worth set to 0");
            0.0
        } else {
            round2(self.prize_pool / total_vouchers as f64)
        };

        info!(total_vouchers, voucher_worth, "Computed voucher worth");

        let clubs = stats
            .into_iter()
            .map(|club| ClubRecord {
                estimated_payout: round2(club.voucher_count as f64 * voucher_worth),
                public_id: club.public_id,
                name: club.name,
                voucher_count: club.voucher_count,
                leaderboard_rank: club.leaderboard_rank,
                fan_count: club.fan_count,
                donation_sum: club.donation_sum,
            })
            .collect();

        Snapshot {
            metadata: RunMetadata {
                timestamp: Utc::now(),
                total_clubs,
                total_vouchers,
                voucher_worth,
            },
            clubs,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn stats(public_id: &str, voucher_count: u64) -> ClubStats {
        ClubStats {
            public_id: public_id.to_string(),
            name: format!("Club {public_id}"),
            voucher_count,
            leaderboard_rank: None,
            fan_count: None,
            donation_sum: None,
        }
    }

    /// Reference scenario: pool 3,000,000 with voucher counts 100 and 0.
    #[test]
    fn test_reference_payouts() {
        let snapshot = PayoutAggregator::new(3_000_000.0)
            .aggregate(vec![stats("a", 100), stats("b", 0)]);

        assert_eq!(snapshot.metadata.total_clubs, 2);
        assert_eq!(snapshot.metadata.total_vouchers, 100);
        assert_eq!(snapshot.metadata.voucher_worth, 30_000.0);
        assert_eq!(snapshot.clubs[0].estimated_payout, 3_000_000.0);
        assert_eq!(snapshot.clubs[1].estimated_payout, 0.0);
    }

    #[test]
    fn test_total_vouchers_matches_sum() {
        let snapshot = PayoutAggregator::new(1_000_000.0)
            .aggregate(vec![stats("a", 3), stats("b", 14), stats("c", 159)]);

        let sum: u64 = snapshot.clubs.iter().map(|c| c.voucher_count).sum();
        assert_eq!(snapshot.metadata.total_vouchers, sum);
    }

    #[test]
    fn test_payout_follows_published_worth() {
        let snapshot = PayoutAggregator::new(1_000_000.0)
            .aggregate(vec![stats("a", 7), stats("b", 13), stats("c", 980)]);

        let worth = snapshot.metadata.voucher_worth;
        for club in &snapshot.clubs {
            let expected = round2(club.voucher_count as f64 * worth);
            assert!((club.estimated_payout - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_vouchers_yields_zero_worth() {
        let snapshot =
            PayoutAggregator::new(3_000_000.0).aggregate(vec![stats("a", 0), stats("b", 0)]);

        assert_eq!(snapshot.metadata.voucher_worth, 0.0);
        assert!(snapshot.clubs.iter().all(|c| c.estimated_payout == 0.0));
    }

    #[test]
    fn test_empty_input_produces_empty_snapshot() {
        let snapshot = PayoutAggregator::new(3_000_000.0).aggregate(vec![]);
        assert_eq!(snapshot.metadata.total_clubs, 0);
        assert_eq!(snapshot.metadata.total_vouchers, 0);
        assert_eq!(snapshot.metadata.voucher_worth, 0.0);
        assert!(snapshot.clubs.is_empty());
    }
}
