use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use uuid::Uuid;

use super::error::{HookKind, TestFailure, TestResult};
use super::report::{ReportBuilder, RunReport};
use super::suite::{Body, Hooks, Suite, SuiteEntry, TestCase};

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Budget for tests without their own timeout, and for every hook
    pub default_timeout: Duration,
    /// Only tests whose full name contains this substring are run
    pub filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(5),
            filter: None,
        }
    }
}

/// Executes a suite tree one test at a time, depth-first in declaration order
pub struct SuiteRunner {
    config: RunnerConfig,
}

impl SuiteRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub async fn run(&self, suite: &Suite) -> RunReport {
        let run_id = Uuid::new_v4().to_string();
        let mut report = ReportBuilder::new(run_id, suite.name.clone());
        let started = Instant::now();

        tracing::info!(
            "Starting run of '{}' with {} tests",
            suite.name,
            suite.test_count()
        );

        let mut path = Vec::new();
        self.run_suite(suite, &mut path, &mut Vec::new(), &mut report)
            .await;

        let report = report.build(chrono::Utc::now());
        tracing::info!(
            "Run completed in {:?}: {} passed, {} failed, {} skipped",
            started.elapsed(),
            report.summary.passed,
            report.summary.failed,
            report.summary.skipped
        );
        report
    }

    fn run_suite<'a, 'b>(
        &'a self,
        suite: &'a Suite,
        path: &'b mut Vec<String>,
        levels: &'b mut Vec<&'a Hooks>,
        report: &'b mut ReportBuilder,
    ) -> BoxFuture<'b, ()>
    where
        'a: 'b,
    {
        async move {
            if self.selected_tests(suite, path) == 0 {
                return;
            }

            tracing::debug!("Entering suite: {}", suite.name);

            let mut setup_failure = None;
            for hook in &suite.hooks.before_all {
                if let Err(e) = self.run_hook(hook, HookKind::BeforeAll).await {
                    setup_failure = Some(e);
                    break;
                }
            }

            match setup_failure {
                Some(failure) => {
                    tracing::warn!("Skipping suite '{}': {}", suite.name, failure);
                    report.record_failure(
                        path,
                        &marker_name(HookKind::BeforeAll),
                        &failure,
                        Duration::ZERO,
                    );
                    let reason = format!("{} hook failed", HookKind::BeforeAll);
                    self.skip_suite(suite, path, &reason, report);
                }
                None => {
                    levels.push(&suite.hooks);
                    for entry in &suite.entries {
                        match entry {
                            SuiteEntry::Test(test) => {
                                if self.is_selected(path, &test.name) {
                                    self.run_test(test, levels, path, report).await;
                                }
                            }
                            SuiteEntry::Suite(nested) => {
                                path.push(nested.name.clone());
                                self.run_suite(nested, path, levels, report).await;
                                path.pop();
                            }
                        }
                    }
                    levels.pop();
                }
            }

            for hook in &suite.hooks.after_all {
                if let Err(failure) = self.run_hook(hook, HookKind::AfterAll).await {
                    tracing::warn!("Teardown of suite '{}' failed: {}", suite.name, failure);
                    report.record_failure(
                        path,
                        &marker_name(HookKind::AfterAll),
                        &failure,
                        Duration::ZERO,
                    );
                }
            }
        }
        .boxed()
    }

    async fn run_test(
        &self,
        test: &TestCase,
        levels: &[&Hooks],
        path: &[String],
        report: &mut ReportBuilder,
    ) {
        if test.pending {
            report.record_skip(path, &test.name, Some("pending".to_string()));
            return;
        }

        let started = Instant::now();
        tracing::debug!("Running test: {}", test.name);

        let mut failure = None;
        'setup: for hooks in levels {
            for hook in &hooks.before_each {
                if let Err(e) = self.run_hook(hook, HookKind::BeforeEach).await {
                    failure = Some(e);
                    break 'setup;
                }
            }
        }

        if failure.is_none() {
            let limit = test.timeout.unwrap_or(self.config.default_timeout);
            if let Err(e) = execute(&test.body, limit).await {
                failure = Some(e);
            }
        }

        // Teardown runs no matter how setup or the body ended
        for hooks in levels.iter().rev() {
            for hook in &hooks.after_each {
                if let Err(e) = self.run_hook(hook, HookKind::AfterEach).await {
                    if failure.is_none() {
                        failure = Some(e);
                    } else {
                        tracing::warn!("Additional teardown failure in '{}': {}", test.name, e);
                    }
                }
            }
        }

        let duration = started.elapsed();
        match failure {
            None => {
                tracing::debug!("Test passed: {} ({:?})", test.name, duration);
                report.record_pass(path, &test.name, duration);
            }
            Some(failure) => {
                tracing::warn!("Test failed: {}: {}", test.name, failure);
                report.record_failure(path, &test.name, &failure, duration);
            }
        }
    }

    async fn run_hook(&self, hook: &Body, kind: HookKind) -> TestResult {
        execute(hook, self.config.default_timeout)
            .await
            .map_err(|e| TestFailure::Hook {
                hook: kind,
                message: e.to_string(),
            })
    }

    fn skip_suite(
        &self,
        suite: &Suite,
        path: &mut Vec<String>,
        reason: &str,
        report: &mut ReportBuilder,
    ) {
        for entry in &suite.entries {
            match entry {
                SuiteEntry::Test(test) if self.is_selected(path, &test.name) => {
                    report.record_skip(path, &test.name, Some(reason.to_string()));
                }
                SuiteEntry::Test(_) => {}
                SuiteEntry::Suite(nested) => {
                    path.push(nested.name.clone());
                    self.skip_suite(nested, path, reason, report);
                    path.pop();
                }
            }
        }
    }

    fn is_selected(&self, path: &[String], name: &str) -> bool {
        match &self.config.filter {
            None => true,
            Some(filter) => {
                let mut full = path.join(" > ");
                if !full.is_empty() {
                    full.push_str(" > ");
                }
                full.push_str(name);
                full.contains(filter.as_str())
            }
        }
    }

    fn selected_tests(&self, suite: &Suite, path: &mut Vec<String>) -> usize {
        suite
            .entries
            .iter()
            .map(|entry| match entry {
                SuiteEntry::Test(test) => usize::from(self.is_selected(path, &test.name)),
                SuiteEntry::Suite(nested) => {
                    path.push(nested.name.clone());
                    let count = self.selected_tests(nested, path);
                    path.pop();
                    count
                }
            })
            .sum()
    }
}

fn marker_name(kind: HookKind) -> String {
    format!("{kind} hook")
}

/// Run `body` on its own task within `limit`.
///
/// On timeout the task is detached rather than aborted: it may keep running,
/// but its result is dropped with the join handle and never reaches a report.
async fn execute(body: &Body, limit: Duration) -> TestResult {
    let handle = tokio::spawn(body());
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(TestFailure::Panicked {
            message: panic_message(join_error),
        }),
        Err(_) => Err(TestFailure::Timeout { after: limit }),
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return "task was cancelled".to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
