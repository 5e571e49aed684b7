//! Multi-strategy club enumeration
//!
//! The search endpoint is cursor-paginated, but any single (ordering, filter)
//! query stops yielding new pages well before the claimed total — an
//! undocumented per-query pagination ceiling. No single walk can be trusted,
//! so enumeration merges walks under diverse sort orderings and, if that
//! still falls short, under category partitions. Diversity of sort keys
//! statistically covers the gaps any one ceiling leaves; the run stops the
//! moment the accumulated unique count reaches the total the API reports for
//! the unfiltered listing.

use crate::api::{self, ClubSearchResponse, ClubSummary};
use crate::config::ScraperConfig;
use crate::http::RetryingHttpClient;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Why a single pagination walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// A page came back with no results
    EmptyPage,
    /// The response carried no `next` cursor
    NoCursor,
    /// The cursor stopped advancing; the query is exhausted
    StuckCursor,
    /// This walk has seen as many results as its query claims to have
    QueryExhausted,
    /// The run-wide expected total has been reached
    ReachedTotal,
    /// A page fetch failed after retries; the walk is incomplete
    Abandoned,
}

/// Accumulated discovery state across all walks of a run
#[derive(Debug, Default)]
struct DiscoveryState {
    /// Deduplicated clubs keyed by public id
    clubs: BTreeMap<String, String>,

    /// Total club count reported by the unfiltered listing, once seen
    expected_total: Option<u64>,
}

impl DiscoveryState {
    fn complete(&self) -> bool {
        self.expected_total
            .is_some_and(|total| self.clubs.len() as u64 >= total)
    }
}

/// Discovers the full deduplicated club identity set
pub struct Enumerator<'a> {
    client: &'a RetryingHttpClient,
    config: &'a ScraperConfig,
}

impl<'a> Enumerator<'a> {
    pub fn new(client: &'a RetryingHttpClient, config: &'a ScraperConfig) -> Self {
        Self { client, config }
    }

    /// Run both strategy tiers and return the deduplicated identity set.
    ///
    /// Discovery order is not significant; the result is sorted by public id.
    pub async fn enumerate(&self) -> Vec<ClubSummary> {
        let mut state = DiscoveryState::default();

        info!("Starting club discovery across ordering strategies");

        // Tier 1: one walk per sort ordering against the unfiltered listing.
        for ordering in &self.config.orderings {
            if state.complete() {
                break;
            }
            let end = self.walk(&mut state, ordering.as_deref(), None).await;
            info!(
                ordering = ordering.as_deref().unwrap_or("default"),
                end = ?end,
                unique = state.clubs.len(),
                expected = ?state.expected_total,
                "Walk finished"
            );
        }

        // Tier 2: category partitions, each under a reduced ordering set.
        if !state.complete() {
            info!("Expected total not reached; walking category partitions");
            'partitions: for partition in &self.config.partitions {
                for ordering in &self.config.partition_orderings {
                    let end = self
                        .walk(&mut state, ordering.as_deref(), Some(partition))
                        .await;
                    debug!(
                        partition,
                        ordering = ordering.as_deref().unwrap_or("default"),
                        end = ?end,
                        unique = state.clubs.len(),
                        "Partition walk finished"
                    );
                    if state.complete() {
                        info!(partition, "Reached expected total, stopping early");
                        break 'partitions;
                    }
                }
            }
        }

        match state.expected_total {
            Some(expected) => info!(
                unique = state.clubs.len(),
                expected, "Club discovery complete"
            ),
            None => warn!(
                unique = state.clubs.len(),
                "Club discovery complete, but the API never reported a total"
            ),
        }

        state
            .clubs
            .into_iter()
            .map(|(public_id, name)| ClubSummary { public_id, name })
            .collect()
    }

    /// One full pagination traversal under a fixed (ordering, filter) pair,
    /// merging every page into the shared discovery state.
    async fn walk(
        &self,
        state: &mut DiscoveryState,
        ordering: Option<&str>,
        age_group: Option<&str>,
    ) -> WalkEnd {
        let mut cursor: Option<String> = None;
        let mut previous_cursor: Option<String> = None;
        let mut page = 1u32;
        let mut query_total: Option<u64> = None;
        let mut seen_in_walk = 0u64;

        loop {
            let url = api::search_url(
                &self.config.base_url,
                self.config.page_size,
                ordering,
                age_group,
                cursor.as_deref(),
            );

            let response: ClubSearchResponse = match self.client.get_json(&url).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(page, error = %err, "Abandoning incomplete walk");
                    return WalkEnd::Abandoned;
                },
            };

            if let Some(total) = response.total_count {
                query_total.get_or_insert(total);
                // Partition-filtered queries report partition-local totals;
                // only the unfiltered listing defines the run-wide target.
                if age_group.is_none() && state.expected_total.is_none() {
                    state.expected_total = Some(total);
                    info!(total, "API reported expected club total");
                }
            }

            if response.results.is_empty() {
                return WalkEnd::EmptyPage;
            }

            seen_in_walk += response.results.len() as u64;
            let mut new_clubs = 0usize;
            for club in response.results {
                if state.clubs.insert(club.public_id, club.name).is_none() {
                    new_clubs += 1;
                }
            }
            debug!(
                page,
                new_clubs,
                unique = state.clubs.len(),
                "Merged search page"
            );

            if state.complete() {
                return WalkEnd::ReachedTotal;
            }

            if query_total.is_some_and(|total| seen_in_walk >= total) {
                return WalkEnd::QueryExhausted;
            }

            let next = match response.next {
                Some(next) => next,
                None => return WalkEnd::NoCursor,
            };

            if previous_cursor.as_deref() == Some(next.as_str()) {
                warn!(page, "Cursor stopped advancing, query exhausted");
                return WalkEnd::StuckCursor;
            }

            previous_cursor = Some(next.clone());
            cursor = Some(next);
            page += 1;
            tokio::time::sleep(self.config.rate_limit_delay).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server_uri: &str) -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.base_url = server_uri.to_string();
        config.rate_limit_delay = Duration::from_millis(1);
        config.retry_delays = vec![Duration::from_millis(1)];
        config
    }

    fn clubs_page(ids: std::ops::Range<u32>) -> Vec<serde_json::Value> {
        ids.map(|i| {
            serde_json::json!({
                "publicId": format!("club-{i:04}"),
                "name": format!("Club {i}")
            })
        })
        .collect()
    }

    fn page_body(
        ids: std::ops::Range<u32>,
        next: Option<&str>,
        total: u64,
    ) -> serde_json::Value {
        serde_json::json!({
            "results": clubs_page(ids),
            "next": next,
            "totalCount": total
        })
    }

    /// 250 clubs over pages of 100/100/50: the first walk reaches the
    /// reported total and no further ordering is attempted.
    #[tokio::test]
    async fn test_stops_after_first_complete_walk() {
        let server = MockServer::start().await;
        let search = "/organisation-search-public/";

        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param_is_missing("cursor"))
            .and(query_param_is_missing("ordering"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(0..100, Some("c1"), 250)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("cursor", "c1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(100..200, Some("c2"), 250)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("cursor", "c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": clubs_page(200..250),
                "totalCount": 250
            })))
            .expect(1)
            .mount(&server)
            .await;
        // No ordering strategy beyond the default pass may be attempted:
        // any request carrying an `ordering` parameter is a failure.
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("ordering", "voucher_count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..0, None, 250)))
            .expect(0)
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let client = RetryingHttpClient::new(&config).unwrap();
        let clubs = Enumerator::new(&client, &config).enumerate().await;

        assert_eq!(clubs.len(), 250);
        server.verify().await;
    }

    /// A cursor returned twice in a row terminates the walk after the second
    /// occurrence instead of looping.
    #[tokio::test]
    async fn test_stuck_cursor_terminates_walk() {
        let server = MockServer::start().await;
        let search = "/organisation-search-public/";

        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param_is_missing("cursor"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(0..10, Some("loop"), 1000)),
            )
            .mount(&server)
            .await;
        // The "loop" cursor keeps answering with itself as next.
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("cursor", "loop"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(10..20, Some("loop"), 1000)),
            )
            .expect(1..)
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        // Single strategy so the walk count is predictable.
        config.orderings = vec![None];
        config.partitions = vec![];

        let client = RetryingHttpClient::new(&config).unwrap();
        let clubs = Enumerator::new(&client, &config).enumerate().await;

        // First page + exactly one fetch of the non-advancing cursor.
        assert_eq!(clubs.len(), 20);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    /// The final set is the same no matter which order the strategies run in.
    #[tokio::test]
    async fn test_strategy_order_does_not_change_result() {
        async fn run_with_orderings(orderings: Vec<Option<String>>) -> Vec<ClubSummary> {
            let server = MockServer::start().await;
            let search = "/organisation-search-public/";

            // Each ordering exposes a different, overlapping slice of the
            // 30-club population; no single walk is complete.
            Mock::given(method("GET"))
                .and(path(search))
                .and(query_param("ordering", "name"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(page_body(0..20, None, 30)),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path(search))
                .and(query_param("ordering", "-name"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(page_body(10..30, None, 30)),
                )
                .mount(&server)
                .await;

            let mut config = test_config(&server.uri());
            config.orderings = orderings;
            config.partitions = vec![];

            let client = RetryingHttpClient::new(&config).unwrap();
            Enumerator::new(&client, &config).enumerate().await
        }

        let forward = run_with_orderings(vec![
            Some("name".to_string()),
            Some("-name".to_string()),
        ])
        .await;
        let backward = run_with_orderings(vec![
            Some("-name".to_string()),
            Some("name".to_string()),
        ])
        .await;

        assert_eq!(forward.len(), 30);
        assert_eq!(forward, backward);
    }

    /// A walk whose fetch fails after retries is abandoned without aborting
    /// enumeration; later strategies still contribute.
    #[tokio::test]
    async fn test_failed_walk_is_isolated() {
        let server = MockServer::start().await;
        let search = "/organisation-search-public/";

        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("ordering", "name"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("ordering", "-name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..5, None, 5)))
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.orderings = vec![Some("name".to_string()), Some("-name".to_string())];
        config.partitions = vec![];

        let client = RetryingHttpClient::new(&config).unwrap();
        let clubs = Enumerator::new(&client, &config).enumerate().await;

        assert_eq!(clubs.len(), 5);
    }

    /// Partition totals never set the run-wide expected total.
    #[tokio::test]
    async fn test_partition_total_does_not_become_global_target() {
        let server = MockServer::start().await;
        let search = "/organisation-search-public/";

        // Unfiltered listing: reports no total at all, yields 10 clubs.
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param_is_missing("camp_age_groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": clubs_page(0..10)
            })))
            .mount(&server)
            .await;
        // Partition claims a total of 2; that must only bound its own walk.
        Mock::given(method("GET"))
            .and(path(search))
            .and(query_param("camp_age_groups", "6_11"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(10..12, None, 2)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.orderings = vec![None];
        config.partitions = vec!["6_11".to_string()];
        config.partition_orderings = vec![None];

        let client = RetryingHttpClient::new(&config).unwrap();
        let clubs = Enumerator::new(&client, &config).enumerate().await;

        // Both the unfiltered clubs and the partition clubs are present.
        assert_eq!(clubs.len(), 12);
    }
}
