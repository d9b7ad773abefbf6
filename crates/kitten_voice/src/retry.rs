//! Retry with exponential backoff for calls to a remote synthesis engine.
//!
//! Retries on transient errors (429, 5xx, 408, network failures).
//! Client errors (400, 404, 422, ...) fail on the first attempt.

use anyhow::Result;
use reqwest::{Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt + 1`, without jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Run `operation` until it yields a successful response, a non-retryable
/// error, or `max_attempts` is exhausted.
pub async fn with_retry<F, Fut>(config: &RetryConfig, target: &str, operation: F) -> Result<Response>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Response>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", target, attempt);
                    }
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                if !is_retryable_status(status) {
                    anyhow::bail!("{} error ({}): {}", target, status, body);
                }
                tracing::warn!(
                    "{} returned {} on attempt {}/{}: {}",
                    target,
                    status,
                    attempt,
                    max_attempts,
                    body.chars().take(200).collect::<String>()
                );
                last_error = Some(format!("{} ({}): {}", target, status, body));
            }
            Err(e) => {
                tracing::warn!(
                    "{} network error on attempt {}/{}: {:#}",
                    target,
                    attempt,
                    max_attempts,
                    e
                );
                last_error = Some(format!("{}: {:#}", target, e));
            }
        }

        if attempt < max_attempts {
            let sleep_time = config.delay_after(attempt) + jitter();
            tracing::info!(
                "{} retrying in {:.2}s (attempt {}/{})",
                target,
                sleep_time.as_secs_f64(),
                attempt + 1,
                max_attempts
            );
            tokio::time::sleep(sleep_time).await;
        }
    }

    anyhow::bail!(
        "All {} attempts exhausted. Last error: {}",
        max_attempts,
        last_error.unwrap_or_else(|| "unknown".to_string())
    )
}

/// 0-100ms derived from the clock's sub-second part.
fn jitter() -> Duration {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    Duration::from_millis((nanos % 100) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_caps() {
        let cfg = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            backoff_factor: 2.0,
        };
        assert_eq!(cfg.delay_after(1), Duration::from_secs(1));
        assert_eq!(cfg.delay_after(2), Duration::from_secs(2));
        assert_eq!(cfg.delay_after(3), Duration::from_secs(3));
        assert_eq!(cfg.delay_after(4), Duration::from_secs(3));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }
}
