//! Opt-in retry with exponential backoff for transient HTTP failures.
//!
//! With `max_retries = 0` a request is sent exactly once. Otherwise
//! connection errors, timeouts, HTTP 429 and HTTP 5xx are retried with
//! delays of 1s, 2s, 4s, ... capped at [`MAX_BACKOFF_SECS`]. Other 4xx
//! responses are permanent and returned immediately.

use std::time::Duration;

use crate::SourceError;

/// Upper bound for a single backoff delay.
const MAX_BACKOFF_SECS: u64 = 32;

/// Sends the request built by `build_request`, retrying transient failures
/// up to `max_retries` times.
///
/// The closure is called once per attempt because builders are consumed by
/// `.send()`. When retries run out on a retryable status, the last
/// response is returned so the caller sees the real status code.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the final attempt fails at the
/// connection level.
pub async fn send_with_retry<F>(
    build_request: F,
    max_retries: u32,
) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    let mut attempt = 0;

    loop {
        match build_request().send().await {
            Err(e) => {
                if !is_transient(&e) || attempt >= max_retries {
                    return Err(SourceError::Http(e));
                }
                log::warn!("  transient error: {e}");
            }
            Ok(response) => {
                let status = response.status();
                if !is_retryable_status(status) || attempt >= max_retries {
                    return Ok(response);
                }
                log::warn!("  HTTP {status} from {}", response.url());
            }
        }

        attempt += 1;
        let delay = backoff(attempt);
        log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
        tokio::time::sleep(delay).await;
    }
}

/// Delay before retry number `attempt` (1-based).
fn backoff(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(MAX_BACKOFF_SECS);
    Duration::from_secs(secs.min(MAX_BACKOFF_SECS))
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(4), Duration::from_secs(8));
        assert_eq!(backoff(10), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff(200), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[test]
    fn retries_rate_limits_and_server_errors_only() {
        assert!(is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(reqwest::StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(reqwest::StatusCode::OK));
    }
}
