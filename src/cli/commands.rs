//! `run` and `list` command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tracing::info;

use crate::capabilities::filesystem::{FsError, LocalFileSystem};
use crate::cli::options::RunArgs;
use crate::config::{ConfigError, HarnessConfig};
use crate::harness::{RunReport, RunnerConfig, Suite, SuiteRunner};
use crate::suites::{self, SuiteContext, SuiteKind};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Sandbox setup failed: {0}")]
    Sandbox(#[from] FsError),

    #[error("Failed to create temporary sandbox: {0}")]
    TempDir(#[source] std::io::Error),
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub config: HarnessConfig,
    pub suites: Vec<SuiteKind>,
    pub root: Option<PathBuf>,
}

impl RunPlan {
    /// Load the config file if any, then apply command-line overrides
    pub async fn from_args(args: &RunArgs) -> Result<Self, CliError> {
        let mut config = match &args.config {
            Some(path) => HarnessConfig::from_file(path).await?,
            None => HarnessConfig::default(),
        };

        if let Some(timeout) = args.timeout {
            config.default_timeout_ms = timeout;
        }
        if args.filter.is_some() {
            config.filter = args.filter.clone();
        }

        Ok(Self {
            config,
            suites: args.selected_suites(),
            root: args.root.clone(),
        })
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            default_timeout: self.config.default_timeout(),
            filter: self.config.filter.clone(),
        }
    }
}

/// Build the suite tree against a sandbox rooted at `root`
pub fn build_suite(plan: &RunPlan, root: &Path) -> Result<Suite, CliError> {
    let fs = LocalFileSystem::open(root)?;
    let context = SuiteContext::new(Arc::new(fs), &plan.config);
    Ok(suites::build(&context, &plan.suites))
}

/// Run the planned suites; a temporary sandbox is removed afterwards
pub async fn execute_run(plan: &RunPlan) -> Result<RunReport, CliError> {
    let temp_root;
    let root = match &plan.root {
        Some(root) => root.clone(),
        None => {
            temp_root = TempDir::new().map_err(CliError::TempDir)?;
            temp_root.path().to_path_buf()
        }
    };

    info!(
        "Running suites {:?} in sandbox {}",
        plan.suites,
        root.display()
    );
    let suite = build_suite(plan, &root)?;
    let report = SuiteRunner::new(plan.runner_config()).run(&suite).await;

    info!(
        "Run {} finished in {:?}: {} passed, {} failed, {} skipped",
        report.run_id,
        report.duration,
        report.summary.passed,
        report.summary.failed,
        report.summary.skipped
    );
    Ok(report)
}

/// Suite tree for `list`; nothing is executed and no sandbox is touched
pub fn outline(kinds: &[SuiteKind]) -> Result<Vec<String>, CliError> {
    let temp = TempDir::new().map_err(CliError::TempDir)?;
    let plan = RunPlan {
        config: HarnessConfig::default(),
        suites: kinds.to_vec(),
        root: None,
    };
    Ok(build_suite(&plan, temp.path())?.outline())
}

/// Exit status for a finished run
pub fn exit_code(report: &RunReport) -> i32 {
    if report.success {
        0
    } else {
        1
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    if duration.as_secs() > 0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
