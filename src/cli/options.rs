use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::suites::SuiteKind;

/// Runs the filesystem and audio integration suites
#[derive(Parser)]
#[command(name = "hostsuite")]
#[command(about = "Integration suites for sandboxed filesystem and audio capabilities")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct HostSuiteCli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run suites and report the results
    Run(RunArgs),

    /// Print the suite tree without running anything
    List {
        /// Suites to include (default: all)
        #[arg(long = "suite", value_enum)]
        suites: Vec<SuiteKind>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Suites to run (default: all)
    #[arg(long = "suite", value_enum)]
    pub suites: Vec<SuiteKind>,

    /// Only run tests whose full name contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Sandbox root for filesystem tests (default: a fresh temporary directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Harness configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Default per-test timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            suites: Vec::new(),
            filter: None,
            root: None,
            config: None,
            format: OutputFormat::Text,
            timeout: None,
        }
    }
}

impl RunArgs {
    /// Requested suites, or every suite when none were named
    pub fn selected_suites(&self) -> Vec<SuiteKind> {
        selected_or_all(&self.suites)
    }
}

pub fn selected_or_all(suites: &[SuiteKind]) -> Vec<SuiteKind> {
    if suites.is_empty() {
        SuiteKind::all()
    } else {
        suites.to_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full report as JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = HostSuiteCli::parse_from([
            "hostsuite",
            "-vv",
            "run",
            "--suite",
            "audio",
            "--filter",
            "setRate",
            "--format",
            "json",
            "--timeout",
            "2000",
        ]);

        assert_eq!(cli.verbosity, 2);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.selected_suites(), vec![SuiteKind::Audio]);
        assert_eq!(args.filter.as_deref(), Some("setRate"));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.timeout, Some(2000));
    }

    #[test]
    fn test_no_command_defaults() {
        let cli = HostSuiteCli::parse_from(["hostsuite"]);
        assert!(cli.command.is_none());
        assert_eq!(
            RunArgs::default().selected_suites(),
            vec![SuiteKind::Filesystem, SuiteKind::Audio]
        );
    }
}
