//! Retrying HTTP fetcher
//!
//! One fetch call owns the full retry loop for a URL: release the request,
//! classify the outcome, back off and retry on transient failures, and give
//! up immediately on permanent ones. The robots gate is consulted before the
//! first request goes out, so a disallowed URL costs zero network calls.

use crate::config::FetchConfig;
use crate::robots::RobotsPolicy;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A completed fetch
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    /// URL the response actually came from, after redirects
    pub final_url: Url,

    /// HTTP status of the final response
    pub status: u16,

    /// Content-Type header, media type only, lowercased
    pub content_type: String,

    /// Response body
    pub body: Vec<u8>,

    /// Requests released for this URL, including the successful one
    pub attempt_count: u32,
}

/// A failed fetch, after the retry loop has run its course
#[derive(Debug, Error)]
pub enum FetchError {
    /// Retryable failures exhausted the retry budget
    #[error("{url}: transient failure after {attempt_count} attempts: {reason}")]
    Transient {
        url: String,
        reason: String,
        attempt_count: u32,
    },

    /// A client error that retrying cannot fix
    #[error("{url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The robots gate said no; no request was released
    #[error("{url}: disallowed by robots.txt")]
    RobotsDisallowed { url: String },
}

/// How a single response or transport error should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptOutcome {
    /// Retry after backoff
    Transient(String),
    /// Fail now
    Permanent(u16),
}

/// Builds the shared HTTP client from fetch configuration
pub fn build_http_client(
    config: &FetchConfig,
    user_agent: &str,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.read_timeout())
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
}

/// Fetcher holding the client, retry policy, and robots gate
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
    robots: Arc<dyn RobotsPolicy>,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, config: FetchConfig, robots: Arc<dyn RobotsPolicy>) -> Self {
        Self {
            client,
            config,
            robots,
        }
    }

    /// Fetches a URL with retries
    ///
    /// Transient failures (HTTP 429, 5xx, timeouts, connection errors) are
    /// retried with exponential backoff and jitter, up to `max-retries`
    /// retries after the first attempt. Other 4xx statuses fail immediately.
    pub async fn fetch(&self, url: &Url) -> Result<FetchSuccess, FetchError> {
        if !self.robots.is_allowed(url) {
            return Err(FetchError::RobotsDisallowed {
                url: url.as_str().to_string(),
            });
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            match self.try_once(url).await {
                Ok(mut success) => {
                    success.attempt_count = attempt;
                    return Ok(success);
                }
                Err(AttemptOutcome::Permanent(status)) => {
                    return Err(FetchError::HttpStatus {
                        url: url.as_str().to_string(),
                        status,
                    });
                }
                Err(AttemptOutcome::Transient(reason)) => {
                    if attempt > self.config.max_retries {
                        return Err(FetchError::Transient {
                            url: url.as_str().to_string(),
                            reason,
                            attempt_count: attempt,
                        });
                    }
                    let delay = with_jitter(backoff_delay(&self.config, attempt));
                    tracing::debug!(
                        "Retrying {} in {}ms (attempt {} failed: {})",
                        url,
                        delay.as_millis(),
                        attempt,
                        reason
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_once(&self, url: &Url) -> Result<FetchSuccess, AttemptOutcome> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        match classify_status(status) {
            StatusClass::Success => {}
            StatusClass::Transient => {
                return Err(AttemptOutcome::Transient(format!("HTTP {}", status)))
            }
            StatusClass::Permanent => return Err(AttemptOutcome::Permanent(status)),
        }

        let final_url = response.url().clone();
        let content_type = media_type(&response);
        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptOutcome::Transient(format!("body read failed: {}", e)))?
            .to_vec();

        Ok(FetchSuccess {
            final_url,
            status,
            content_type,
            body,
            attempt_count: 0,
        })
    }
}

/// Rough classification of an HTTP status for retry purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Success,
    Transient,
    Permanent,
}

fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::Transient,
        500..=599 => StatusClass::Transient,
        _ => StatusClass::Permanent,
    }
}

fn classify_transport_error(e: reqwest::Error) -> AttemptOutcome {
    if e.is_redirect() {
        // Redirect loops do not resolve themselves
        AttemptOutcome::Permanent(0)
    } else {
        AttemptOutcome::Transient(e.to_string())
    }
}

/// Un-jittered backoff delay for the given attempt number (1-based)
fn backoff_delay(config: &FetchConfig, attempt: u32) -> Duration {
    let shift = (attempt - 1).min(16);
    let exp = config
        .retry_base_delay()
        .saturating_mul(1u32.checked_shl(shift).unwrap_or(u32::MAX));
    exp.min(config.retry_max_delay())
}

/// Adds up to 25% random jitter so synchronized retries spread out
fn with_jitter(delay: Duration) -> Duration {
    let span = delay.as_millis() as u64 / 4;
    if span == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=span))
}

/// Media type from the Content-Type header, lowercased, parameters stripped
fn media_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_config(base_ms: u64, max_ms: u64, retries: u32) -> FetchConfig {
        FetchConfig {
            connect_timeout_ms: 1000,
            read_timeout_ms: 1000,
            max_retries: retries,
            retry_base_delay_ms: base_ms,
            retry_max_delay_ms: max_ms,
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify_status(429), StatusClass::Transient);
        assert_eq!(classify_status(500), StatusClass::Transient);
        assert_eq!(classify_status(503), StatusClass::Transient);
        assert_eq!(classify_status(400), StatusClass::Permanent);
        assert_eq!(classify_status(403), StatusClass::Permanent);
        assert_eq!(classify_status(404), StatusClass::Permanent);
        assert_eq!(classify_status(410), StatusClass::Permanent);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let config = fetch_config(100, 60_000, 3);
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(400));
        assert_eq!(backoff_delay(&config, 4), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let config = fetch_config(1000, 2500, 10);
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(2500));
        assert_eq!(backoff_delay(&config, 10), Duration::from_millis(2500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let base = Duration::from_millis(400);
        for _ in 0..50 {
            let jittered = with_jitter(base);
            assert!(jittered >= base);
            assert!(jittered <= base + Duration::from_millis(100));
        }
    }

    #[test]
    fn test_jitter_noop_on_tiny_delay() {
        assert_eq!(
            with_jitter(Duration::from_millis(1)),
            Duration::from_millis(1)
        );
    }
}
