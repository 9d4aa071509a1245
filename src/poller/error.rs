use std::time::Duration;
use thiserror::Error;

use super::shape::{Snapshot, StatusShape};

/// Status never converged within the poll budget
#[derive(Debug, Clone, Error)]
#[error(
    "status did not match {expected} after {attempts} attempts ({elapsed:?}); last status: {}",
    describe_last(.last)
)]
pub struct PollTimeoutError {
    pub expected: StatusShape,
    pub last: Option<Snapshot>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl PollTimeoutError {
    /// Mismatch descriptions against the last observed snapshot
    pub fn mismatches(&self) -> Vec<String> {
        self.last
            .as_ref()
            .map(|last| self.expected.mismatches(last))
            .unwrap_or_default()
    }
}

fn describe_last(last: &Option<Snapshot>) -> String {
    match last {
        Some(snapshot) => serde_json::Value::Object(snapshot.clone()).to_string(),
        None => "none".to_string(),
    }
}

#[derive(Debug, Clone, Error)]
pub enum PollError {
    #[error(transparent)]
    Timeout(#[from] PollTimeoutError),

    #[error("Status retrieval failed: {message}")]
    Source { message: String },
}
