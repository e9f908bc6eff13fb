//! Pure formatting functions for console output.

use crate::engine::RunReport;
use crate::sync::SyncAction;
use crate::warnings::RunWarning;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a non-fatal warning.
pub fn display_warning(warning: &RunWarning) {
    println!("{} {}", style("WARNING:").yellow().bold(), warning);
}

/// One line per alias outcome, e.g. `v1.2 -> 1a2b3c4 (updated)`
pub fn format_alias_line(alias: &str, commit: &str, action: SyncAction) -> String {
    let short = commit.get(..7).unwrap_or(commit);
    format!("{} -> {} ({})", alias, short, action)
}

/// Final summary of a run.
pub fn display_report(report: &RunReport, dry_run: bool) {
    let verb = if dry_run { "Would create" } else { "Created" };

    for tag in &report.created_tags {
        display_success(&format!("{} tag {}", verb, style(tag).green()));
    }
    for branch in &report.created_branches {
        display_success(&format!("{} branch {}", verb, style(branch).green()));
    }
    for outcome in &report.aliases {
        display_status(&format_alias_line(
            &outcome.alias,
            &outcome.commit,
            outcome.action,
        ));
    }
    for warning in &report.warnings {
        display_warning(warning);
    }

    if report.is_noop() {
        println!("\n{}", style("Nothing to release").bold());
    } else {
        println!(
            "\n{} {} tag(s), {} branch(es), {} alias(es)",
            style(if dry_run { "Planned" } else { "Released" }).bold(),
            report.created_tags.len(),
            report.created_branches.len(),
            report.aliases.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_alias_line_shortens_hash() {
        let line = format_alias_line("v1.2", "0123456789abcdef", SyncAction::Updated);
        assert_eq!(line, "v1.2 -> 0123456 (updated)");
    }

    #[test]
    fn test_format_alias_line_short_hash() {
        let line = format_alias_line("latest", "abc", SyncAction::Created);
        assert_eq!(line, "latest -> abc (created)");
    }
}
