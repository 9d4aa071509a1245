//! hostsuite - integration suites for sandboxed filesystem and audio capabilities
//!
//! The crate provides a small behavior-driven harness (`describe`/`it`/`expect`
//! through [`harness::SuiteBuilder`]), a status poller that waits for
//! asynchronous state to converge, in-process filesystem and audio
//! capabilities, and the suites that exercise them.

pub mod capabilities;
pub mod cli;
pub mod config;
pub mod harness;
pub mod poller;
pub mod suites;

pub use config::HarnessConfig;
pub use harness::{RunReport, Suite, SuiteBuilder, SuiteRunner};
