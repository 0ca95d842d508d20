//! Retry-with-backoff policy for transient service failures

use std::time::Duration;

use backon::ExponentialBuilder;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};

/// Longest delay honored from a `Retry-After` header, and cap of the backoff
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// `base_delay * 2^attempt`, at most `max_retries` times
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(MAX_RETRY_DELAY)
            .with_max_times(self.max_retries as usize)
    }
}

/// Throttling and gateway failures are worth another attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Outcome of one failed attempt, before it becomes a [`ClientError`]
///
/// [`ClientError`]: super::ClientError
#[derive(Debug, thiserror::Error)]
pub(crate) enum SendFailure {
    #[error("service returned {}", .0.status())]
    Status(Response),

    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("request body is not retryable")]
    NotCloneable,
}

impl SendFailure {
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            SendFailure::Status(response) => is_retryable_status(response.status()),
            SendFailure::Transport(e) => e.is_connect() || e.is_timeout(),
            SendFailure::NotCloneable => false,
        }
    }

    /// Server-requested delay, capped
    pub(crate) fn retry_after(&self) -> Option<Duration> {
        let SendFailure::Status(response) = self else {
            return None;
        };

        response
            .headers()
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_DELAY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let delays: Vec<Duration> = policy.backoff().build().collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.backoff().build().count(), 0);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }
}
