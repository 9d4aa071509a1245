//! Status polling for objects whose state converges asynchronously
//!
//! `retry_for_status` repeatedly reads a snapshot from a [`StatusSource`]
//! until every field named in a [`StatusShape`] matches, or the configured
//! budget runs out.

pub mod error;
pub mod shape;

pub use error::*;
pub use shape::*;

use async_trait::async_trait;
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Anything that can report its current status as a snapshot
#[async_trait]
pub trait StatusSource: Send + Sync {
    type Error: Display + Send;

    async fn snapshot(&self) -> Result<Snapshot, Self::Error>;
}

/// Shortest pause between attempts; a zero interval would spin
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Upper bound on polling before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollBudget {
    /// Retries after the first attempt
    MaxRetries(u32),
    /// Wall time measured from the first attempt
    MaxDuration(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub budget: PollBudget,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            budget: PollBudget::MaxRetries(100),
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.budget = PollBudget::MaxRetries(retries);
        self
    }

    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.budget = PollBudget::MaxDuration(duration);
        self
    }

    /// Time to wait before the next attempt, `None` once the budget is spent
    fn next_delay(&self, attempts: u32, elapsed: Duration) -> Option<Duration> {
        let interval = self.interval.max(MIN_POLL_INTERVAL);
        match self.budget {
            PollBudget::MaxRetries(retries) => (attempts <= retries).then_some(interval),
            PollBudget::MaxDuration(limit) => {
                (elapsed < limit).then(|| interval.min(limit - elapsed))
            }
        }
    }
}

/// Poll `source` until its status matches `expected`.
///
/// The first attempt happens immediately. Between attempts the calling task
/// sleeps for `config.interval`. Only the fields present in `expected` are
/// compared. A status retrieval error stops polling at once.
pub async fn retry_for_status<S>(
    source: &S,
    expected: &StatusShape,
    config: &PollConfig,
) -> Result<Snapshot, PollError>
where
    S: StatusSource + ?Sized,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let snapshot = source
            .snapshot()
            .await
            .map_err(|e| PollError::Source {
                message: e.to_string(),
            })?;

        if expected.matches(&snapshot) {
            tracing::debug!(
                "Status matched {} after {} attempt(s) in {:?}",
                expected,
                attempts,
                started.elapsed()
            );
            return Ok(snapshot);
        }

        tracing::trace!(
            "Poll attempt {} did not match: {:?}",
            attempts,
            expected.mismatches(&snapshot)
        );

        let elapsed = started.elapsed();
        match config.next_delay(attempts, elapsed) {
            Some(delay) => sleep(delay).await,
            None => {
                return Err(PollError::Timeout(PollTimeoutError {
                    expected: expected.clone(),
                    last: Some(snapshot),
                    attempts,
                    elapsed,
                }))
            }
        }
    }
}

/// Suspend the calling task for `duration`
pub async fn wait_for(duration: Duration) {
    sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports `ready: true` from the `converge_at`-th read onwards
    struct CountingSource {
        reads: AtomicU32,
        converge_at: Option<u32>,
    }

    impl CountingSource {
        fn new(converge_at: Option<u32>) -> Self {
            Self {
                reads: AtomicU32::new(0),
                converge_at,
            }
        }

        fn reads(&self) -> u32 {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for CountingSource {
        type Error = String;

        async fn snapshot(&self) -> Result<Snapshot, String> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            let ready = self.converge_at.is_some_and(|n| read >= n);
            Ok(json!({"ready": ready, "read": read})
                .as_object()
                .cloned()
                .unwrap_or_default())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl StatusSource for BrokenSource {
        type Error = String;

        async fn snapshot(&self) -> Result<Snapshot, String> {
            Err("object was released".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_matches_on_first_attempt_without_waiting() {
        let source = CountingSource::new(Some(1));
        let started = Instant::now();

        let status = retry_for_status(
            &source,
            &StatusShape::new().field("ready", true),
            &PollConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(status["read"], json!(1));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_exactly_at_nth_attempt() {
        let source = CountingSource::new(Some(5));
        let config = PollConfig::default().with_interval(Duration::from_millis(50));
        let started = Instant::now();

        let status = retry_for_status(&source, &StatusShape::new().field("ready", true), &config)
            .await
            .unwrap();

        assert_eq!(source.reads(), 5);
        assert_eq!(status["read"], json!(5));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let source = CountingSource::new(None);
        let config = PollConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_max_retries(3);

        let err = retry_for_status(&source, &StatusShape::new().field("ready", true), &config)
            .await
            .unwrap_err();

        assert_eq!(source.reads(), 4);
        match err {
            PollError::Timeout(timeout) => {
                assert_eq!(timeout.attempts, 4);
                assert_eq!(timeout.last.as_ref().unwrap()["ready"], json!(false));
                assert_eq!(timeout.mismatches().len(), 1);
                assert!(timeout.to_string().contains("ready: true"));
            }
            other => panic!("Expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_budget_not_exhausted_early() {
        let source = CountingSource::new(None);
        let config = PollConfig::default()
            .with_interval(Duration::from_millis(30))
            .with_max_duration(Duration::from_millis(100));
        let started = Instant::now();

        let err = retry_for_status(&source, &StatusShape::new().field("ready", true), &config)
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_millis(100));
        // 0, 30, 60, 90 and the final attempt at the 100ms deadline
        assert_eq!(source.reads(), 5);
        assert!(matches!(err, PollError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_error_stops_polling() {
        let err = retry_for_status(
            &BrokenSource,
            &StatusShape::new().field("ready", true),
            &PollConfig::default(),
        )
        .await
        .unwrap_err();

        match err {
            PollError::Source { message } => assert_eq!(message, "object was released"),
            other => panic!("Expected source error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_yields_and_ends() {
        let source = CountingSource::new(None);
        let config = PollConfig {
            interval: Duration::ZERO,
            budget: PollBudget::MaxDuration(Duration::from_millis(10)),
        };
        let started = Instant::now();

        let err = retry_for_status(&source, &StatusShape::new().field("ready", true), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Timeout(_)));
        assert!(started.elapsed() >= Duration::from_millis(10));
        assert!((2..=11).contains(&source.reads()));
        assert_eq!(
            PollConfig::default().with_interval(Duration::ZERO).interval,
            MIN_POLL_INTERVAL
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_suspends() {
        let started = Instant::now();
        wait_for(Duration::from_millis(500)).await;
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
