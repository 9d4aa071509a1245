use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{FailureKind, TestFailure};

/// Final state of one test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Test execution record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    /// Enclosing suite names, outermost first
    pub suite_path: Vec<String>,
    pub name: String,
    pub outcome: Outcome,
    pub failure_kind: Option<FailureKind>,
    pub message: Option<String>,
    pub duration: Duration,
}

impl TestRecord {
    pub fn full_name(&self) -> String {
        let mut parts = self.suite_path.clone();
        parts.push(self.name.clone());
        parts.join(" > ")
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timed_out: usize,
}

/// Overall run result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub suite: String,
    pub success: bool,
    pub records: Vec<TestRecord>,
    pub summary: RunSummary,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter().filter(|r| r.failed())
    }

    pub fn find(&self, name: &str) -> Option<&TestRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

/// Accumulates records while a run is in progress
pub struct ReportBuilder {
    run_id: String,
    suite: String,
    records: Vec<TestRecord>,
    start_time: DateTime<Utc>,
}

impl ReportBuilder {
    pub fn new(run_id: String, suite: String) -> Self {
        Self {
            run_id,
            suite,
            records: Vec::new(),
            start_time: Utc::now(),
        }
    }

    pub fn record_pass(&mut self, suite_path: &[String], name: &str, duration: Duration) {
        self.push(suite_path, name, Outcome::Passed, None, duration);
    }

    pub fn record_failure(
        &mut self,
        suite_path: &[String],
        name: &str,
        failure: &TestFailure,
        duration: Duration,
    ) {
        self.push(suite_path, name, Outcome::Failed, Some(failure), duration);
    }

    pub fn record_skip(&mut self, suite_path: &[String], name: &str, reason: Option<String>) {
        self.records.push(TestRecord {
            suite_path: suite_path.to_vec(),
            name: name.to_string(),
            outcome: Outcome::Skipped,
            failure_kind: None,
            message: reason,
            duration: Duration::ZERO,
        });
    }

    fn push(
        &mut self,
        suite_path: &[String],
        name: &str,
        outcome: Outcome,
        failure: Option<&TestFailure>,
        duration: Duration,
    ) {
        self.records.push(TestRecord {
            suite_path: suite_path.to_vec(),
            name: name.to_string(),
            outcome,
            failure_kind: failure.map(TestFailure::kind),
            message: failure.map(ToString::to_string),
            duration,
        });
    }

    pub fn build(self, end_time: DateTime<Utc>) -> RunReport {
        let duration = (end_time - self.start_time)
            .to_std()
            .unwrap_or(Duration::from_secs(0));

        let summary = RunSummary {
            total: self.records.len(),
            passed: self.records.iter().filter(|r| r.passed()).count(),
            failed: self.records.iter().filter(|r| r.failed()).count(),
            skipped: self
                .records
                .iter()
                .filter(|r| r.outcome == Outcome::Skipped)
                .count(),
            timed_out: self
                .records
                .iter()
                .filter(|r| r.failure_kind == Some(FailureKind::Timeout))
                .count(),
        };

        RunReport {
            run_id: self.run_id,
            suite: self.suite,
            success: summary.failed == 0,
            records: self.records,
            summary,
            start_time: self.start_time,
            end_time,
            duration,
        }
    }
}
