//! Long-running operation poller
//!
//! Drives a caller-supplied probe until the remote operation it observes
//! succeeds, fails, or the deadline passes. Probes never overlap: the next one
//! is issued only after the previous future resolved and the interval elapsed.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Message used when a failed operation carries no error detail
pub const GENERIC_FAILURE_MESSAGE: &str = "Generic error during prediction";

/// State of a remote operation as reported by one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Succeeded,
    /// Failed, with the service's error message when it sent one
    Failed(Option<String>),
}

impl PollState {
    /// Interpret a `succeeded` / `failed` / other status string (case-insensitive)
    pub fn from_status(status: &str) -> Self {
        if status.eq_ignore_ascii_case("succeeded") {
            Self::Succeeded
        } else if status.eq_ignore_ascii_case("failed") {
            Self::Failed(None)
        } else {
            Self::Pending
        }
    }
}

/// A payload that reports the progress of a remote operation
pub trait Pollable {
    fn poll_state(&self) -> PollState;
}

/// Deadline and pacing for [`poll`]
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Total budget measured from the start of the poll
    pub timeout: Duration,
    /// Delay between a pending result and the next probe
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            interval: Duration::from_millis(100),
        }
    }
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    #[error("{0}")]
    Failed(String),

    #[error("Timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error(transparent)]
    Probe(E),
}

/// Probe until the operation settles.
///
/// A probe error ends the poll immediately; transient transport failures are
/// expected to be retried by the probe itself.
pub async fn poll<T, E, F, Fut>(mut probe: F, options: PollOptions) -> Result<T, PollError<E>>
where
    T: Pollable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let payload = probe().await.map_err(PollError::Probe)?;

        match payload.poll_state() {
            PollState::Succeeded => {
                tracing::debug!(attempts, "Operation succeeded");
                return Ok(payload);
            }
            PollState::Failed(message) => {
                let message = message.unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                tracing::warn!(attempts, %message, "Operation failed");
                return Err(PollError::Failed(message));
            }
            PollState::Pending if Instant::now() < deadline => {
                tokio::time::sleep(options.interval).await;
            }
            PollState::Pending => {
                tracing::warn!(attempts, timeout_ms = options.timeout.as_millis() as u64, "Operation timed out");
                return Err(PollError::TimedOut { attempts });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct Status(&'static str, Option<&'static str>);

    impl Pollable for Status {
        fn poll_state(&self) -> PollState {
            match PollState::from_status(self.0) {
                PollState::Failed(_) => PollState::Failed(self.1.map(str::to_string)),
                state => state,
            }
        }
    }

    fn scripted(
        responses: Vec<Status>,
    ) -> (
        Arc<Mutex<u32>>,
        impl FnMut() -> std::future::Ready<Result<Status, String>>,
    ) {
        let calls = Arc::new(Mutex::new(0));
        let queue = Arc::new(Mutex::new(VecDeque::from(responses)));
        let counter = calls.clone();
        let probe = move || {
            *counter.lock().unwrap() += 1;
            let next = queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Status("running", None));
            std::future::ready(Ok(next))
        };
        (calls, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_probes_once() {
        let (calls, probe) = scripted(vec![Status("succeeded", None)]);

        let result = poll(probe, PollOptions::default()).await.unwrap();

        assert_eq!(result.0, "succeeded");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_is_case_insensitive() {
        let (_, probe) = scripted(vec![Status("Running", None), Status("SUCCEEDED", None)]);
        assert!(poll(probe, PollOptions::default()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_carries_service_message() {
        let (_, probe) = scripted(vec![Status("failed", Some("X"))]);

        let err = poll(probe, PollOptions::default()).await.unwrap_err();

        assert!(matches!(err, PollError::Failed(ref m) if m == "X"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_message_uses_fallback() {
        let (_, probe) = scripted(vec![Status("failed", None)]);

        let err = poll(probe, PollOptions::default()).await.unwrap_err();

        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_window() {
        for (timeout_ms, interval_ms) in [(1000u64, 300u64), (500, 500), (250, 1000), (1, 1)] {
            let options = PollOptions::new(
                Duration::from_millis(timeout_ms),
                Duration::from_millis(interval_ms),
            );
            let (_, probe) = scripted(vec![]);
            let start = Instant::now();

            let err = poll(probe, options).await.unwrap_err();
            let elapsed = start.elapsed();

            assert!(matches!(err, PollError::TimedOut { .. }));
            assert!(elapsed >= options.timeout, "rejected early: {:?}", elapsed);
            assert!(
                elapsed <= options.timeout + options.interval,
                "rejected late: {:?}",
                elapsed
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_aborts() {
        let mut calls = 0;
        let probe = || {
            calls += 1;
            std::future::ready(Err::<Status, _>("connection reset"))
        };

        let err = poll(probe, PollOptions::default()).await.unwrap_err();

        assert!(matches!(err, PollError::Probe("connection reset")));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_between_probes() {
        let (calls, probe) = scripted(vec![
            Status("notStarted", None),
            Status("running", None),
            Status("succeeded", None),
        ]);
        let options = PollOptions::new(Duration::from_secs(10), Duration::from_millis(200));
        let start = Instant::now();

        poll(probe, options).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }
}
