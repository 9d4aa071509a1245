use anyhow::Result;
use clap::Parser;
use hostsuite::cli::{
    execute_run, exit_code, outline, print_outline, print_report, print_report_json, selected_or_all,
    Commands, HostSuiteCli, OutputFormat, RunArgs, RunPlan,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HostSuiteCli::parse();

    let level = match cli.verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting hostsuite v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::List { suites }) => {
            let lines = outline(&selected_or_all(&suites))?;
            print_outline(&lines);
            Ok(())
        }
        Some(Commands::Run(args)) => run(args).await,
        None => run(RunArgs::default()).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let plan = RunPlan::from_args(&args).await?;
    let report = execute_run(&plan).await?;

    match args.format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => print_report_json(&report)?,
    }

    let code = exit_code(&report);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
