use crate::cli::commands::format_duration;
use crate::harness::{Outcome, RunReport, TestRecord};

/// Print a run report in human-readable format
pub fn print_report(report: &RunReport) {
    println!("🧪 Test Run {}", report.run_id);
    println!("================================================");
    println!();

    let mut current_path: Option<&[String]> = None;
    for record in &report.records {
        if current_path != Some(record.suite_path.as_slice()) {
            println!("📂 {}", record.suite_path.join(" > "));
            current_path = Some(record.suite_path.as_slice());
        }
        print_record(record);
    }
    println!();

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("❌ Failures:");
        for record in failures {
            println!("  • {}", record.full_name());
            if let Some(message) = &record.message {
                println!("    {}", message);
            }
        }
        println!();
    }

    let summary = &report.summary;
    println!("📊 Summary:");
    println!("  Total: {}", summary.total);
    println!("  Passed: {}", summary.passed);
    println!("  Failed: {}", summary.failed);
    if summary.timed_out > 0 {
        println!("  Timed out: {}", summary.timed_out);
    }
    println!("  Skipped: {}", summary.skipped);
    println!("  Duration: {}", format_duration(report.duration));
    println!();

    if report.success {
        println!("✅ All tests passed");
    } else {
        println!("❌ {} test(s) failed", summary.failed);
    }
}

fn print_record(record: &TestRecord) {
    let marker = match record.outcome {
        Outcome::Passed => "✅",
        Outcome::Failed => "❌",
        Outcome::Skipped => "⏭️ ",
    };
    println!(
        "  {} {} ({})",
        marker,
        record.name,
        format_duration(record.duration)
    );
}

/// Print a run report as pretty JSON
pub fn print_report_json(report: &RunReport) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Print the suite tree produced by `list`
pub fn print_outline(lines: &[String]) {
    println!("📋 Registered suites");
    println!("================================================");
    for line in lines {
        println!("{}", line);
    }
}
