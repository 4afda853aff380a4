//! Output formatting and styling module.
//!
//! Human-facing summaries go to stdout with `colored`; diagnostics go through
//! `tracing`. Keeping them apart lets `--json` replace the summaries without
//! touching the log stream.

use crate::pruner::PruneReport;
use crate::relocator::RelocationPlan;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for file moves, or a hidden one when `visible`
    /// is false.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use camsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100, true);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64, visible: bool) -> ProgressBar {
        if !visible {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints one row per category plan with where its files go.
    pub fn plan_table(plans: &[RelocationPlan], dry_run: bool) {
        Self::header(if dry_run { "PLANNED MOVES" } else { "SUMMARY" });

        let rows: Vec<(&str, usize, String)> = plans
            .iter()
            .map(|plan| {
                (
                    plan.category.label(),
                    plan.len(),
                    plan.destination_dir.display().to_string(),
                )
            })
            .collect();

        let width = rows
            .iter()
            .map(|(label, _, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {:>5} | {}",
            "Category".bold(),
            "Files".bold(),
            "Destination".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 30));

        for (label, count, destination) in &rows {
            println!(
                "{:<width$} | {:>5} | {}",
                label,
                count.to_string().green(),
                destination,
                width = width
            );
        }

        let total: usize = rows.iter().map(|(_, count, _)| count).sum();
        println!("{}", "-".repeat(width + 30));
        println!(
            "{:<width$} | {:>5} |",
            "Total".bold(),
            total.to_string().green().bold(),
            width = width
        );

        let collisions: usize = plans
            .iter()
            .map(|plan| plan.moves.iter().filter(|m| m.collided).count())
            .sum();
        if collisions > 0 {
            Self::warning(&format!(
                "{} {} renumbered to avoid existing names",
                collisions,
                if collisions == 1 { "file was" } else { "files were" }
            ));
        }

        for plan in plans {
            for dup in &plan.duplicates {
                Self::warning(&format!(
                    "{} appears {} times among the {}",
                    dup.name,
                    dup.count,
                    plan.category.label()
                ));
            }
        }
    }

    /// Prints the tally of a prune pass.
    pub fn prune_summary(report: &PruneReport, dry_run: bool) {
        Self::header("ORPHANED RAW FILES");
        println!("  Examined: {}", report.total_examined());
        println!("  Kept:     {}", report.retained.to_string().green());
        println!("  Orphaned: {}", report.orphans.len().to_string().yellow());

        if dry_run {
            for orphan in &report.orphans {
                println!("    - {}", orphan.path.display());
            }
            return;
        }

        println!("  Deleted:  {}", report.deleted.len().to_string().green());
        if !report.failed.is_empty() {
            println!("  Failed:   {}", report.failed.len().to_string().red());
            for (path, reason) in &report.failed {
                Self::error(&format!("{}: {}", path.display(), reason));
            }
        }
    }
}
