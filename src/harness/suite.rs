//! Suite tree and the builder that registers it

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::TestResult;

/// Type-erased async body shared by tests and hooks
pub type Body = Arc<dyn Fn() -> BoxFuture<'static, TestResult> + Send + Sync>;

fn boxed<F, Fut>(body: F) -> Body
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TestResult> + Send + 'static,
{
    Arc::new(move || body().boxed())
}

/// A single registered test
#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub timeout: Option<Duration>,
    pub pending: bool,
    pub(crate) body: Body,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) before_all: Vec<Body>,
    pub(crate) after_all: Vec<Body>,
    pub(crate) before_each: Vec<Body>,
    pub(crate) after_each: Vec<Body>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_all", &self.before_all.len())
            .field("after_all", &self.after_all.len())
            .field("before_each", &self.before_each.len())
            .field("after_each", &self.after_each.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum SuiteEntry {
    Test(TestCase),
    Suite(Suite),
}

/// Named group of tests, nested suites and hooks
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub entries: Vec<SuiteEntry>,
    pub hooks: Hooks,
}

impl Suite {
    /// Number of tests in this suite and every nested suite
    pub fn test_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                SuiteEntry::Test(_) => 1,
                SuiteEntry::Suite(suite) => suite.test_count(),
            })
            .sum()
    }

    /// Indented outline of the tree, one line per suite or test
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_into(0, &mut lines);
        lines
    }

    fn outline_into(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        lines.push(format!("{indent}{}", self.name));
        for entry in &self.entries {
            match entry {
                SuiteEntry::Test(test) if test.pending => {
                    lines.push(format!("{indent}  - {} (pending)", test.name))
                }
                SuiteEntry::Test(test) => lines.push(format!("{indent}  - {}", test.name)),
                SuiteEntry::Suite(suite) => suite.outline_into(depth + 1, lines),
            }
        }
    }
}

/// Registers suites, tests and hooks without running any of them.
///
/// ```no_run
/// use hostsuite::harness::{expect, SuiteBuilder};
///
/// let mut root = SuiteBuilder::new("math");
/// root.describe("addition", |suite| {
///     suite.it("adds", || async { expect(1 + 1).to_be(2) });
/// });
/// let suite = root.build();
/// assert_eq!(suite.test_count(), 1);
/// ```
pub struct SuiteBuilder {
    suite: Suite,
}

impl SuiteBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            suite: Suite {
                name: name.into(),
                entries: Vec::new(),
                hooks: Hooks::default(),
            },
        }
    }

    /// Register a nested suite; `register` runs immediately and only registers
    pub fn describe<F>(&mut self, name: impl Into<String>, register: F) -> &mut Self
    where
        F: FnOnce(&mut SuiteBuilder),
    {
        let mut nested = SuiteBuilder::new(name);
        register(&mut nested);
        self.suite.entries.push(SuiteEntry::Suite(nested.build()));
        self
    }

    pub fn it<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.push_test(name.into(), None, false, boxed(body))
    }

    pub fn it_with_timeout<F, Fut>(
        &mut self,
        name: impl Into<String>,
        timeout: Duration,
        body: F,
    ) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.push_test(name.into(), Some(timeout), false, boxed(body))
    }

    /// Register a pending test; it is reported as skipped and never run
    pub fn skip<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.push_test(name.into(), None, true, boxed(body))
    }

    fn push_test(
        &mut self,
        name: String,
        timeout: Option<Duration>,
        pending: bool,
        body: Body,
    ) -> &mut Self {
        self.suite.entries.push(SuiteEntry::Test(TestCase {
            name,
            timeout,
            pending,
            body,
        }));
        self
    }

    pub fn before_all<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.suite.hooks.before_all.push(boxed(hook));
        self
    }

    pub fn after_all<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.suite.hooks.after_all.push(boxed(hook));
        self
    }

    pub fn before_each<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.suite.hooks.before_each.push(boxed(hook));
        self
    }

    pub fn after_each<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.suite.hooks.after_each.push(boxed(hook));
        self
    }

    pub fn build(self) -> Suite {
        self.suite
    }
}
