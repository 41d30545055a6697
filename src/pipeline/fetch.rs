//! Article retrieval with status classification and jittered backoff.
//!
//! ## Retry Strategy
//!
//! Only a fixed set of statuses is considered transient: 429, 500, 502, 503
//! and 504, plus transport failures (connection refused, reset, timeout).
//! Everything else is permanent: 404 surfaces as [`DownloadError::NotFound`]
//! and any other non-success status as [`DownloadError::DownloadFailed`]
//! without a second attempt.
//!
//! Transient failures are retried up to `max_retries` times with exponential
//! backoff (`base * 2^(retry-1)`), each delay scaled by a random factor in
//! `[0.5, 1.5)` so concurrent clients drift apart instead of retrying in
//! lockstep. With the default 1 s base and 3 retries the nominal waits are
//! 1 s → 2 s → 4 s.
//!
//! Cancellation is checked at every suspension point (politeness delay,
//! backoff sleeps, request, body read) and aborts immediately with
//! [`DownloadError::Cancelled`]; it never counts as an attempt.

use crate::config::ConvertConfig;
use crate::error::DownloadError;
use crate::progress::ProgressCallback;
use rand::Rng;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Statuses worth retrying.
const TRANSIENT_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Returns `true` for the statuses the fetcher retries.
pub fn is_transient_status(status: StatusCode) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Check that the input is an absolute HTTP/HTTPS URL.
pub fn parse_locator(input: &str) -> Result<Url, DownloadError> {
    let trimmed = input.trim();
    let invalid = |reason: String| DownloadError::InvalidLocator {
        url: input.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("URL is empty".into()));
    }
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Backoff schedule for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Nominal (unjittered) delay before the 1-indexed `retry`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// [`Self::backoff`] scaled by a random factor in `[0.5, 1.5)`.
    pub fn jittered(&self, retry: u32) -> Duration {
        let factor: f64 = rand::rng().random_range(0.5..1.5);
        self.backoff(retry).mul_f64(factor)
    }
}

/// Why an attempt should be retried.
#[derive(Debug)]
enum Failure {
    Status(StatusCode),
    Transport(String),
}

impl Failure {
    fn describe(&self) -> String {
        match self {
            Failure::Status(s) => format!("HTTP {s}"),
            Failure::Transport(e) => e.clone(),
        }
    }
}

/// Result of one request.
enum Outcome {
    Body(String),
    Retry(Failure),
    Reject(StatusCode),
}

/// Downloads article markup. Stateless across calls apart from the
/// connection pool inside the HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
    politeness_delay: Duration,
    progress: Option<ProgressCallback>,
}

impl Fetcher {
    pub fn new(config: &ConvertConfig) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;

        Ok(Self {
            client,
            policy: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
            },
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
            progress: config.progress_callback.clone(),
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url` and return the response body verbatim.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String, DownloadError> {
        let parsed = parse_locator(url)?;
        let start = Instant::now();
        info!("Fetching article: {}", parsed);
        if let Some(ref cb) = self.progress {
            cb.on_fetch_start(url);
        }

        self.pause(self.politeness_delay, url, cancel).await?;

        let mut last: Option<Failure> = None;
        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                let delay = self.policy.jittered(attempt);
                let reason = last.as_ref().map(Failure::describe).unwrap_or_default();
                warn!(
                    "{}: retry {}/{} after {}ms ({})",
                    url,
                    attempt,
                    self.policy.max_retries,
                    delay.as_millis(),
                    reason
                );
                if let Some(ref cb) = self.progress {
                    cb.on_fetch_retry(attempt, self.policy.max_retries, delay.as_millis() as u64, &reason);
                }
                self.pause(delay, url, cancel).await?;
            }

            match self.attempt(&parsed, url, cancel).await? {
                Outcome::Body(text) => {
                    debug!(
                        "Fetched {} bytes in {:?} ({} attempt(s))",
                        text.len(),
                        start.elapsed(),
                        attempt + 1
                    );
                    if let Some(ref cb) = self.progress {
                        cb.on_fetched(text.len());
                    }
                    return Ok(text);
                }
                Outcome::Reject(StatusCode::NOT_FOUND) => {
                    return Err(DownloadError::NotFound {
                        url: url.to_string(),
                    });
                }
                Outcome::Reject(status) => {
                    return Err(DownloadError::DownloadFailed {
                        url: url.to_string(),
                        status: Some(status.as_u16()),
                        detail: reason_phrase(status),
                    });
                }
                Outcome::Retry(failure) => {
                    debug!("{}: attempt {} failed: {}", url, attempt + 1, failure.describe());
                    last = Some(failure);
                }
            }
        }

        let attempts = self.policy.max_retries + 1;
        Err(match last {
            Some(Failure::Status(StatusCode::TOO_MANY_REQUESTS)) => DownloadError::RateLimitExceeded {
                url: url.to_string(),
                attempts,
            },
            Some(Failure::Status(status)) => DownloadError::DownloadFailed {
                url: url.to_string(),
                status: Some(status.as_u16()),
                detail: format!("{} after {attempts} attempts", reason_phrase(status)),
            },
            Some(Failure::Transport(reason)) => DownloadError::DownloadFailed {
                url: url.to_string(),
                status: None,
                detail: format!("{reason} after {attempts} attempts"),
            },
            None => DownloadError::DownloadFailed {
                url: url.to_string(),
                status: None,
                detail: "no attempt was made".into(),
            },
        })
    }

    /// Issue one request and classify the result.
    async fn attempt(
        &self,
        parsed: &Url,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome, DownloadError> {
        let send = self.client.get(parsed.clone()).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(url)),
            r = send => r,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => return Ok(Outcome::Retry(Failure::Transport(transport_reason(&e)))),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(if is_transient_status(status) {
                Outcome::Retry(Failure::Status(status))
            } else {
                Outcome::Reject(status)
            });
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(url)),
            b = response.text() => b,
        };
        Ok(match body {
            Ok(text) => Outcome::Body(text),
            Err(e) => Outcome::Retry(Failure::Transport(transport_reason(&e))),
        })
    }

    /// Sleep for `delay` unless the token fires first.
    async fn pause(&self, delay: Duration, url: &str, cancel: &CancellationToken) -> Result<(), DownloadError> {
        if delay.is_zero() {
            return if cancel.is_cancelled() {
                Err(cancelled(url))
            } else {
                Ok(())
            };
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(cancelled(url)),
            _ = sleep(delay) => Ok(()),
        }
    }
}

fn cancelled(url: &str) -> DownloadError {
    DownloadError::Cancelled {
        url: url.to_string(),
    }
}

fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("status {}", status.as_u16()))
}

fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}
