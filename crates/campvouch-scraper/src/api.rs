//! Upstream API endpoints and wire types
//!
//! URL construction and the deserialized shapes of the two read-only
//! endpoints the scraper talks to: the cursor-paginated club search and the
//! per-club statistics endpoint. Required fields are enforced by the types;
//! a response missing one fails deserialization and is handled as a
//! malformed response by the HTTP client.

use serde::{Deserialize, Serialize};

/// URL of one club search page
pub fn search_url(
    base_url: &str,
    page_size: u32,
    ordering: Option<&str>,
    age_group: Option<&str>,
    cursor: Option<&str>,
) -> String {
    let mut url = format!(
        "{}/organisation-search-public/?page_size={}",
        base_url.trim_end_matches('/'),
        page_size
    );
    if let Some(ordering) = ordering {
        url.push_str("&ordering=");
        url.push_str(ordering);
    }
    if let Some(age_group) = age_group {
        url.push_str("&camp_age_groups=");
        url.push_str(age_group);
    }
    if let Some(cursor) = cursor {
        url.push_str("&cursor=");
        url.push_str(cursor);
    }
    url
}

/// URL of one club's statistics
pub fn stats_url(base_url: &str, public_id: &str) -> String {
    format!(
        "{}/organisation-public/{}/stats/",
        base_url.trim_end_matches('/'),
        public_id
    )
}

/// A club identity as listed by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ClubSummary {
    /// Opaque unique identifier
    pub public_id: String,

    /// Display name
    pub name: String,
}

/// One page of the club search endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSearchResponse {
    /// Clubs on this page
    pub results: Vec<ClubSummary>,

    /// Opaque cursor for the next page; absent on the last page
    #[serde(default)]
    pub next: Option<String>,

    /// Total result count the API claims for this query
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Per-club statistics response
///
/// `voucherCount` is the one field the pipeline cannot proceed without; the
/// rest the API reports only sometimes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubStatsResponse {
    pub voucher_count: u64,

    #[serde(default)]
    pub leaderboard_rank: Option<i64>,

    #[serde(default)]
    pub fan_count: Option<u64>,

    #[serde(default)]
    pub donation_sum: Option<f64>,
}
