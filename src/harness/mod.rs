//! Behavior-driven test harness
//!
//! Suites are registered through an explicit [`SuiteBuilder`] and executed by
//! a [`SuiteRunner`], which produces a [`RunReport`]. Failures, panics and
//! timeouts are caught at the test-case boundary; teardown hooks always run.

pub mod error;
pub mod expect;
pub mod fixture;
pub mod report;
pub mod runner;
pub mod suite;

pub use error::*;
pub use expect::*;
pub use fixture::Fixture;
pub use report::*;
pub use runner::*;
pub use suite::*;
