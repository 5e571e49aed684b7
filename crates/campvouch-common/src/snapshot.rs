//! Published snapshot model
//!
//! One scraper run produces exactly one snapshot: run metadata plus one
//! record per club whose statistics were fetched successfully. Snapshots are
//! written as pretty-printed JSON to a timestamped file and mirrored to
//! `latest.json`; the dashboard and the forecasting job read this format and
//! nothing else, so the field names here are the wire format.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata describing one scraper run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// When the run's aggregation happened
    pub timestamp: DateTime<Utc>,

    /// Number of clubs with successfully fetched statistics
    pub total_clubs: usize,

    /// Sum of voucher counts over all included clubs
    pub total_vouchers: u64,

    /// Prize-pool share of a single voucher, in CHF (0 when no vouchers)
    pub voucher_worth: f64,
}

/// One club's aggregated record as published
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClubRecord {
    /// Opaque club identifier from the upstream API
    pub public_id: String,

    /// Display name
    pub name: String,

    /// Vouchers attributed to the club
    pub voucher_count: u64,

    /// `voucher_count * voucher_worth`, rounded to centimes
    pub estimated_payout: f64,

    /// Position on the upstream leaderboard, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard_rank: Option<i64>,

    /// Number of fans, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_count: Option<u64>,

    /// Accumulated donations in CHF, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_sum: Option<f64>,
}

/// A complete published run result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub metadata: RunMetadata,
    pub clubs: Vec<ClubRecord>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    /// Serialize to the published pretty-printed JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Round to two decimal places, half away from zero.
///
/// Payouts are money; banker's rounding would make published figures differ
/// from what people compute by hand.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
