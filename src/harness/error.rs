use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::capabilities::audio::AudioError;
use crate::capabilities::filesystem::FsError;
use crate::poller::{PollError, PollTimeoutError};

/// Failure of a single test case, caught at the test-case boundary
#[derive(Debug, Clone, Error)]
pub enum TestFailure {
    #[error("Assertion failed: {message}")]
    Assertion { message: String },

    #[error("Poll timed out: {0}")]
    PollTimeout(PollTimeoutError),

    #[error("External operation failed: {message}")]
    External { message: String },

    #[error("Test timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Test panicked: {message}")]
    Panicked { message: String },

    #[error("{hook} hook failed: {message}")]
    Hook { hook: HookKind, message: String },
}

impl TestFailure {
    pub fn assertion(message: impl Into<String>) -> Self {
        TestFailure::Assertion {
            message: message.into(),
        }
    }

    pub fn external(message: impl fmt::Display) -> Self {
        TestFailure::External {
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            TestFailure::Assertion { .. } => FailureKind::Assertion,
            TestFailure::PollTimeout(_) => FailureKind::PollTimeout,
            TestFailure::External { .. } => FailureKind::External,
            TestFailure::Timeout { .. } => FailureKind::Timeout,
            TestFailure::Panicked { .. } => FailureKind::Panic,
            TestFailure::Hook { .. } => FailureKind::Hook,
        }
    }
}

impl From<FsError> for TestFailure {
    fn from(error: FsError) -> Self {
        TestFailure::external(error)
    }
}

impl From<AudioError> for TestFailure {
    fn from(error: AudioError) -> Self {
        TestFailure::external(error)
    }
}

impl From<PollError> for TestFailure {
    fn from(error: PollError) -> Self {
        match error {
            PollError::Timeout(timeout) => TestFailure::PollTimeout(timeout),
            PollError::Source { message } => TestFailure::External { message },
        }
    }
}

/// Coarse failure classification carried into reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Assertion,
    PollTimeout,
    External,
    Timeout,
    Panic,
    Hook,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Assertion => "assertion",
            FailureKind::PollTimeout => "poll timeout",
            FailureKind::External => "external",
            FailureKind::Timeout => "timeout",
            FailureKind::Panic => "panic",
            FailureKind::Hook => "hook",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HookKind::BeforeAll => "\"before all\"",
            HookKind::AfterAll => "\"after all\"",
            HookKind::BeforeEach => "\"before each\"",
            HookKind::AfterEach => "\"after each\"",
        };
        f.write_str(label)
    }
}

/// Result of a test body or hook
pub type TestResult = Result<(), TestFailure>;
