//! Retrying HTTP client
//!
//! One GET per call, wrapped in a bounded retry loop with an incremental
//! backoff schedule. Failures are classified as transient (network error,
//! timeout, non-2xx status) or malformed (empty body, undecodable JSON,
//! missing required field); both classes are retried, and after the attempt
//! budget is exhausted the caller receives a [`FetchError`] carrying enough
//! diagnostic context to debug the upstream without reproducing the run.
//! Whether a failure is fatal is the caller's decision, not this module's.

use crate::config::ScraperConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

// The upstream answers plain non-browser clients with 403.
const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const ACCEPT_VALUE: &str = "application/json, text/plain, */*";
const ACCEPT_LANGUAGE_VALUE: &str = "de-CH,de;q=0.9,en;q=0.8";

/// Maximum characters of response body kept for diagnostics
const BODY_PREVIEW_LIMIT: usize = 200;

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Network/timeout failure or non-2xx status; worth retrying as-is
    Transient,
    /// Empty, undecodable, or structurally invalid response body
    Malformed,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Transient => write!(f, "transient error"),
            FetchErrorKind::Malformed => write!(f, "malformed response"),
        }
    }
}

/// A fetch that failed after exhausting its retry budget
#[derive(Debug, Error)]
#[error("{kind} for {url} after {attempts} attempts: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub attempts: u32,
    pub message: String,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub body_preview: Option<String>,
}

/// Outcome of a single attempt, before retry accounting
#[derive(Debug)]
struct AttemptFailure {
    kind: FetchErrorKind,
    message: String,
    status: Option<u16>,
    content_type: Option<String>,
    body_preview: Option<String>,
}

/// HTTP client with bounded-retry fetch discipline
pub struct RetryingHttpClient {
    client: reqwest::Client,
    attempts: u32,
    delays: Vec<Duration>,
}

impl RetryingHttpClient {
    /// Build a client from the scraper configuration
    pub fn new(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT_VALUE)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            attempts: config.retry_attempts.max(1),
            delays: config.retry_delays.clone(),
        })
    }

    /// Delay before the retry following attempt number `attempt` (0-based).
    /// The last scheduled value repeats when attempts outnumber the schedule.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        match self.delays.last() {
            Some(last) => self
                .delays
                .get(attempt as usize)
                .copied()
                .unwrap_or(*last),
            None => Duration::ZERO,
        }
    }

    /// GET `url` and deserialize the JSON body into `T`, retrying per the
    /// configured schedule.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut last_failure: Option<AttemptFailure> = None;

        for attempt in 1..=self.attempts {
            match self.try_get::<T>(url).await {
                Ok(value) => return Ok(value),
                Err(failure) => {
                    if attempt < self.attempts {
                        let delay = self.backoff_delay(attempt - 1);
                        warn!(
                            url,
                            attempt,
                            max_attempts = self.attempts,
                            status = ?failure.status,
                            error = %failure.message,
                            delay_ms = delay.as_millis() as u64,
                            "Fetch failed, retrying"
                        );
                        last_failure = Some(failure);
                        tokio::time::sleep(delay).await;
                    } else {
                        last_failure = Some(failure);
                    }
                },
            }
        }

        let failure = last_failure.unwrap_or_else(|| AttemptFailure {
            kind: FetchErrorKind::Transient,
            message: "no attempts were made".to_string(),
            status: None,
            content_type: None,
            body_preview: None,
        });

        error!(
            url,
            attempts = self.attempts,
            status = ?failure.status,
            content_type = ?failure.content_type,
            body_preview = ?failure.body_preview,
            error = %failure.message,
            "Fetch failed after all attempts"
        );

        Err(FetchError {
            kind: failure.kind,
            url: url.to_string(),
            attempts: self.attempts,
            message: failure.message,
            status: failure.status,
            content_type: failure.content_type,
            body_preview: failure.body_preview,
        })
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str) -> Result<T, AttemptFailure> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                return Err(AttemptFailure {
                    kind: FetchErrorKind::Transient,
                    message: format!("request error: {err}"),
                    status: None,
                    content_type: None,
                    body_preview: None,
                })
            },
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return Err(AttemptFailure {
                    kind: FetchErrorKind::Transient,
                    message: format!("failed to read response body: {err}"),
                    status: Some(status.as_u16()),
                    content_type,
                    body_preview: None,
                })
            },
        };

        if !status.is_success() {
            return Err(AttemptFailure {
                kind: FetchErrorKind::Transient,
                message: format!("HTTP status {status}"),
                status: Some(status.as_u16()),
                content_type,
                body_preview: Some(preview(&body)),
            });
        }

        if body.trim().is_empty() {
            return Err(AttemptFailure {
                kind: FetchErrorKind::Malformed,
                message: "empty response body".to_string(),
                status: Some(status.as_u16()),
                content_type,
                body_preview: None,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|err| AttemptFailure {
            kind: FetchErrorKind::Malformed,
            message: format!("JSON decode error: {err}"),
            status: Some(status.as_u16()),
            content_type,
            body_preview: Some(preview(&body)),
        })
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    fn test_client(delays_ms: &[u64]) -> RetryingHttpClient {
        let mut config = ScraperConfig::default();
        config.retry_delays = delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect();
        RetryingHttpClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&[10, 20]);
        let payload: Payload = client.get_json(&format!("{}/ok", server.uri())).await.unwrap();
        assert_eq!(payload, Payload { value: 7 });
    }

    #[tokio::test]
    async fn test_retry_schedule_then_success() {
        let server = MockServer::start().await;

        // Two failures, then success: the mocks expire in mount order.
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&[30, 60]);
        let start = Instant::now();
        let payload: Payload = client
            .get_json(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(payload, Payload { value: 3 });
        // Slept the first two scheduled delays, in order, before succeeding.
        assert!(elapsed >= Duration::from_millis(90), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_exhausted_retries_returns_transient_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&[1, 2, 4]);
        let url = format!("{}/gone", server.uri());
        let err = client.get_json::<Payload>(&url).await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Transient);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.status, Some(503));
        assert_eq!(err.url, url);
        assert_eq!(err.body_preview.as_deref(), Some("upstream down"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>maintenance</html>", "text/html"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&[1]);
        let err = client
            .get_json::<Payload>(&format!("{}/html", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Malformed);
        assert_eq!(err.content_type.as_deref(), Some("text/html"));
        assert_eq!(err.body_preview.as_deref(), Some("<html>maintenance</html>"));
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&[1]);
        let err = client
            .get_json::<Payload>(&format!("{}/empty", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Malformed);
        assert!(err.message.contains("empty response body"));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/partial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"other": 1})))
            .mount(&server)
            .await;

        let client = test_client(&[1]);
        let err = client
            .get_json::<Payload>(&format!("{}/partial", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Malformed);
        assert!(err.message.contains("JSON decode error"));
    }

    #[test]
    fn test_backoff_schedule_repeats_last_delay() {
        let client = test_client(&[10, 20, 40]);
        assert_eq!(client.backoff_delay(0), Duration::from_millis(10));
        assert_eq!(client.backoff_delay(1), Duration::from_millis(20));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(40));
        assert_eq!(client.backoff_delay(9), Duration::from_millis(40));

        let empty = test_client(&[]);
        assert_eq!(empty.backoff_delay(0), Duration::ZERO);
    }
}
