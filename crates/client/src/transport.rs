//! Resilient transport for auth-endpoint calls.
//!
//! Responsibilities:
//! - Execute token and login requests with a bounded attempt budget.
//! - Classify each attempt (success, retry after a delay, terminal failure).
//! - Observe caller cancellation during attempts and backoff sleeps.
//!
//! Does NOT handle:
//! - Building auth payloads (see `token`).
//! - Retrying the API requests the hook decorates.
//!
//! Invariants:
//! - At most `max_attempts` requests are sent; the same body is sent every time.
//! - HTTP 200 succeeds, 429 sleeps `attempt` seconds, any other status is terminal.
//! - Network and body-read failures are retried without a delay.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use cribl_config::constants::MAX_AUTH_ATTEMPTS;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;

/// `Content-Type` of JSON auth payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// `Content-Type` of form-encoded auth payloads.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// A re-sendable `POST` to an auth endpoint.
#[derive(Clone)]
pub struct AuthRequest {
    url: String,
    content_type: &'static str,
    body: Vec<u8>,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bodies carry client secrets and passwords.
        f.debug_struct("AuthRequest")
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("body", &format_args!("<{} bytes>", self.body.len()))
            .finish()
    }
}

impl AuthRequest {
    /// JSON-encoded request.
    pub fn json<T: Serialize>(url: impl Into<String>, payload: &T) -> Result<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ClientError::Configuration(format!("failed to encode auth request: {e}")))?;
        Ok(Self {
            url: url.into(),
            content_type: CONTENT_TYPE_JSON,
            body,
        })
    }

    /// Form-urlencoded request.
    pub fn form(url: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish()
            .into_bytes();
        Self {
            url: url.into(),
            content_type: CONTENT_TYPE_FORM,
            body,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Status and body of one attempt.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// What to do after one attempt.
#[derive(Debug)]
pub enum Outcome {
    Success(Vec<u8>),
    Retry {
        delay: Duration,
        status: Option<u16>,
        detail: String,
    },
    Fail(ClientError),
}

/// Classify the result of attempt number `attempt` (1-based).
pub fn classify(attempt: usize, result: Result<RawResponse>, url: &str) -> Outcome {
    match result {
        Err(e) if e.is_retryable() => Outcome::Retry {
            delay: Duration::ZERO,
            status: None,
            detail: e.to_string(),
        },
        Err(e) => Outcome::Fail(e),
        Ok(response) => match response.status {
            200 => Outcome::Success(response.body),
            429 => Outcome::Retry {
                delay: Duration::from_secs(attempt as u64),
                status: Some(429),
                detail: String::from_utf8_lossy(&response.body).into_owned(),
            },
            status => Outcome::Fail(ClientError::UpstreamAuthFailure {
                url: url.to_string(),
                status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        },
    }
}

/// Drive `attempt_fn` until it succeeds, fails terminally, or the budget runs out.
///
/// `attempt_fn` receives the 1-based attempt number.
///
/// # Errors
///
/// - `Cancelled` if `cancel` fires during an attempt or a backoff sleep.
/// - `TransientUpstream` with the last status and body once attempts run out.
/// - Any terminal error returned by [`classify`].
pub async fn execute_with<F, Fut>(
    url: &str,
    max_attempts: usize,
    cancel: &CancellationToken,
    metrics: &MetricsCollector,
    mut attempt_fn: F,
) -> Result<Vec<u8>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<RawResponse>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_status = None;
    let mut last_detail = String::new();

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if attempt > 1 {
            metrics.record_retry(attempt);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = attempt_fn(attempt) => result,
        };

        match classify(attempt, result, url) {
            Outcome::Success(body) => {
                if attempt > 1 {
                    debug!(attempt, url, "Auth request succeeded after retry");
                }
                return Ok(body);
            }
            Outcome::Fail(e) => return Err(e),
            Outcome::Retry {
                delay,
                status,
                detail,
            } => {
                last_status = status;
                last_detail = detail;
                if attempt == max_attempts {
                    break;
                }

                debug!(
                    attempt,
                    max_attempts,
                    status = ?status,
                    delay_secs = delay.as_secs(),
                    url,
                    "Retrying auth request"
                );
                if !delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    debug!(attempts = max_attempts, url, "Auth request attempts exhausted");
    Err(ClientError::TransientUpstream {
        url: url.to_string(),
        attempts: max_attempts,
        status: last_status,
        body: last_detail,
    })
}

/// HTTP executor used by the token manager.
#[derive(Debug, Clone)]
pub struct ResilientTransport {
    http: reqwest::Client,
    max_attempts: usize,
    metrics: MetricsCollector,
}

impl ResilientTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            max_attempts: MAX_AUTH_ATTEMPTS,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Send `request`, returning the body of the first 200 response.
    pub async fn execute(
        &self,
        request: &AuthRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let http = &self.http;
        execute_with(
            &request.url,
            self.max_attempts,
            cancel,
            &self.metrics,
            move |_| async move {
                let response = http
                    .post(request.url.as_str())
                    .header(CONTENT_TYPE, request.content_type)
                    .body(request.body.clone())
                    .send()
                    .await?;
                let status = response.status().as_u16();
                let body = response.bytes().await.map_err(|e| {
                    ClientError::Transport(format!("failed to read response body: {e}"))
                })?;
                Ok(RawResponse {
                    status,
                    body: body.to_vec(),
                })
            },
        )
        .await
    }
}
