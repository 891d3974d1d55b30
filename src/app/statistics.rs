//! End-of-run statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::audit::ActionKind;
use crate::error_handling::{MutationKind, RunStats};
use crate::run::RunReport;

/// Prints per-kind action counts, failure counts and a one-line summary.
pub fn print_run_summary(report: &RunReport) {
    print_action_statistics(&report.stats);
    print_simple_summary(report);
}

/// Prints non-zero action and failure counts to the log.
pub fn print_action_statistics(stats: &RunStats) {
    let total_actions = stats.total_actions();
    if total_actions > 0 {
        info!("Action Counts ({} total):", total_actions);
        for kind in ActionKind::iter() {
            let count = stats.action_count(kind);
            if count > 0 {
                info!("   {}: {}", kind.as_str(), count);
            }
        }
    }

    let total_failures = stats.total_failures();
    if total_failures > 0 {
        info!("Failed Mutations ({} total):", total_failures);
        for kind in MutationKind::iter() {
            let count = stats.failure_count(kind);
            if count > 0 {
                info!("   {}: {}", kind.as_str(), count);
            }
        }
    }
}

fn print_simple_summary(report: &RunReport) {
    let changes = report.stats.total_changes();
    info!(
        "{} {} change{} ({} failed) in {:.1}s - see {} for details",
        if report.dry_run { "Would make" } else { "Made" },
        changes,
        if changes == 1 { "" } else { "s" },
        report.failures,
        report.elapsed_seconds,
        report.log_file.display()
    );
}
