// Terminal UI utilities
// Phase banners and the end-of-run summary.

use colored::Colorize;

use crate::domain::{Phase, ReleaseOutcome, RunReport};

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_phase(phase: Phase) {
    print_header(&format!("{} {}", phase.emoji(), phase.name()));
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// One line per release, then the overall verdict
pub fn print_summary(report: &RunReport) {
    print_header("Summary");

    for release in &report.releases {
        let line = format!("{:<28} {}", release.name, release.outcome);
        match release.outcome {
            ReleaseOutcome::Removed => println!("  {}", line.green()),
            ReleaseOutcome::NotFound => println!("  {}", line.dimmed()),
            ReleaseOutcome::Failed(_) => println!("  {}", line.red()),
        }
    }
    println!();

    match (&report.failure, report.release_failures()) {
        (Some(failure), _) => print_error(&format!(
            "{} failed: {}",
            failure.phase.name(),
            failure.error
        )),
        (None, 0) => print_success("Cleanup complete"),
        (None, n) => print_warning(&format!(
            "Cleanup complete, {} release(s) could not be removed",
            n
        )),
    }
}
