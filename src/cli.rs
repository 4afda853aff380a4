//! Command dispatch for camsort.
//!
//! This module turns a parsed [`Command`] into calls on the core:
//! - `Reorganize` plans every category first, then executes the plans
//! - `PruneOrphans` runs a single prune pass
//!
//! All plan-phase failures surface before any file is moved.

use crate::config::Settings;
use crate::file_category::{Classifier, ExtensionCategory};
use crate::output::OutputFormatter;
use crate::pruner::{OrphanPruner, PruneReport};
use crate::relocator::{RelocationPlan, Relocator};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// The operation the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move camera files from `source` into category directories under
    /// `destination`, renumbered by modification time.
    Reorganize {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Delete raw files in `raw_dir` with no processed sibling in
    /// `processed_dir`.
    PruneOrphans {
        processed_dir: PathBuf,
        raw_dir: PathBuf,
    },
}

/// Flags that apply to every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute and report, but never mutate the filesystem.
    pub dry_run: bool,
    /// Print results as JSON instead of tables.
    pub json: bool,
    /// Draw a progress bar while moving files.
    pub progress: bool,
}

/// Runs `command` with `settings`.
///
/// # Examples
///
/// ```no_run
/// use camsort::cli::{run_command, Command, RunOptions};
/// use camsort::config::Settings;
///
/// let command = Command::Reorganize {
///     source: "/media/sdcard".into(),
///     destination: "/backup/2024-06".into(),
/// };
/// let options = RunOptions { dry_run: true, ..Default::default() };
/// run_command(&command, &Settings::default(), options).unwrap();
/// ```
pub fn run_command(command: &Command, settings: &Settings, options: RunOptions) -> Result<()> {
    match command {
        Command::Reorganize {
            source,
            destination,
        } => {
            reorganize(source, destination, settings, options)?;
        }
        Command::PruneOrphans {
            processed_dir,
            raw_dir,
        } => {
            let report = prune_orphans(processed_dir, raw_dir, settings, options)?;
            ensure_pruned(&report)?;
        }
    }
    Ok(())
}

/// Fails if any orphan in `report` could not be deleted.
fn ensure_pruned(report: &PruneReport) -> Result<()> {
    if !report.is_complete_success() {
        anyhow::bail!(
            "{} of {} orphaned raw files could not be deleted",
            report.failed.len(),
            report.orphans.len()
        );
    }
    Ok(())
}

/// Plans every category in order, then executes the plans in the same
/// order. Returns the plans.
pub fn reorganize(
    source: &Path,
    destination: &Path,
    settings: &Settings,
    options: RunOptions,
) -> Result<Vec<RelocationPlan>> {
    info!(
        "{}Reorganizing {} into {}",
        if options.dry_run { "[dry run] " } else { "" },
        source.display(),
        destination.display()
    );

    let classifier = Classifier::new(settings);
    let relocator = Relocator::new(settings, options.dry_run);

    let mut plans = Vec::with_capacity(ExtensionCategory::ALL.len());
    for category in ExtensionCategory::ALL {
        let extension = classifier.extension_for(category);
        let plan = relocator
            .plan(source, destination, extension)
            .with_context(|| format!("planning {}", category.label()))?;
        info!(
            "Planned {} {} -> {}",
            plan.len(),
            category.label(),
            plan.destination_dir.display()
        );
        plans.push(plan);
    }

    let total: usize = plans.iter().map(RelocationPlan::len).sum();
    let pb = OutputFormatter::create_progress_bar(
        total as u64,
        options.progress && !options.dry_run && !options.json,
    );
    for plan in &plans {
        pb.set_message(plan.category.label());
        let moved = relocator
            .execute_with_progress(plan, |_| pb.inc(1))
            .with_context(|| format!("moving {}", plan.category.label()));
        if moved.is_err() {
            pb.abandon();
        }
        let moved = moved?;
        if !options.dry_run {
            info!("Moved {} {}", moved, plan.category.label());
        }
    }
    pb.finish_and_clear();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        OutputFormatter::plan_table(&plans, options.dry_run);
        if options.dry_run {
            OutputFormatter::dry_run_notice("No files were moved.");
        } else {
            OutputFormatter::success(&format!("Reorganized {} files", total));
        }
    }

    Ok(plans)
}

/// Runs the orphan pruner and reports the outcome.
pub fn prune_orphans(
    processed_dir: &Path,
    raw_dir: &Path,
    settings: &Settings,
    options: RunOptions,
) -> Result<PruneReport> {
    info!(
        "{}Pruning raw files in {} against {}",
        if options.dry_run { "[dry run] " } else { "" },
        raw_dir.display(),
        processed_dir.display()
    );

    let pruner = OrphanPruner::new(settings, options.dry_run);
    let report = pruner
        .prune_orphan_raws(processed_dir, raw_dir)
        .context("pruning orphaned raw files")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        OutputFormatter::prune_summary(&report, options.dry_run);
        if options.dry_run {
            OutputFormatter::dry_run_notice("No files were deleted.");
        }
    }

    Ok(report)
}
