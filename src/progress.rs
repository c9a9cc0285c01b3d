//! Startup header and end-of-run summary
//!
//! The live feed during a run is the reporter echoing each record as it is
//! written; this module only brackets it with a styled header and a final
//! tally.

use crate::pipeline::RunResult;
use console::style;

/// Print a header at the start of the run
pub fn print_header(endpoint: &str, workers: usize, output: &str) {
    println!();
    println!(
        "{} {}",
        style("o365-userenum").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Endpoint:").bold(), endpoint);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}

/// Print a summary of the run results
pub fn print_summary(result: &RunResult, output: &str) {
    println!();
    if result.completed {
        println!("{}", style("Enumeration Complete").green().bold());
    } else {
        println!("{}", style("Enumeration Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Candidates:").bold(), result.candidates);
    println!("  {} {}", style("Probed:").bold(), result.outcomes.probed);
    println!(
        "  {} {}",
        style("Valid users:").bold(),
        result.outcomes.valid_users
    );
    println!(
        "  {} {}",
        style("Invalid users:").bold(),
        result.outcomes.invalid_users
    );
    println!(
        "  {} {}",
        style("2FA logins:").bold(),
        result.outcomes.second_factor
    );
    println!(
        "  {} {}",
        style("Full logins:").bold(),
        result.outcomes.valid_logins
    );
    println!("  {} {}", style("Unknown:").bold(), result.outcomes.unknown);
    if result.outcomes.transport_errors > 0 {
        println!(
            "  {} {}",
            style("Probe errors:").yellow().bold(),
            result.outcomes.transport_errors
        );
    }
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        result.duration.as_secs_f64()
    );
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}
