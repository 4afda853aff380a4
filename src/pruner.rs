/// Removal of raw files that have no processed counterpart.
///
/// A raw file is kept when the paired processed directory holds a file with
/// the same base name and the processed extension. Everything else in the
/// raw directory with the raw extension is an orphan.
use crate::config::Settings;
use crate::error::{MediaError, MediaResult};
use crate::scan;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A raw file with no processed sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanCandidate {
    pub path: PathBuf,
    pub base_name: String,
}

/// Outcome of a prune pass.
#[derive(Debug, Default, Serialize)]
pub struct PruneReport {
    /// Every orphan found, deleted or not.
    pub orphans: Vec<OrphanCandidate>,
    /// Orphans that were removed from disk.
    pub deleted: Vec<PathBuf>,
    /// Orphans that could not be removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Raw files that have a processed sibling.
    pub retained: usize,
}

impl PruneReport {
    /// Returns true if no deletion failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the number of raw files examined.
    pub fn total_examined(&self) -> usize {
        self.orphans.len() + self.retained
    }
}

/// Finds and deletes orphaned raw files.
#[derive(Debug, Clone)]
pub struct OrphanPruner {
    processed_extension: String,
    raw_extension: String,
    dry_run: bool,
}

impl OrphanPruner {
    pub fn new(settings: &Settings, dry_run: bool) -> Self {
        Self {
            processed_extension: settings.extensions.processed.clone(),
            raw_extension: settings.extensions.raw.clone(),
            dry_run,
        }
    }

    /// Lists the orphaned raw files in `raw_dir` without deleting anything.
    ///
    /// Returns the orphans and the number of raws that have a match.
    pub fn find_orphans(
        &self,
        processed_dir: &Path,
        raw_dir: &Path,
    ) -> MediaResult<(Vec<OrphanCandidate>, usize)> {
        let processed: HashSet<String> =
            scan::find_by_extension(processed_dir, &self.processed_extension, false)?
                .iter()
                .map(|file| file.base_name())
                .collect();
        debug!(
            "{} processed files in {}",
            processed.len(),
            processed_dir.display()
        );

        let raws = scan::find_by_extension(raw_dir, &self.raw_extension, false)?;
        let mut orphans = Vec::new();
        let mut retained = 0;
        for raw in raws {
            let base_name = raw.base_name();
            if processed.contains(&base_name) {
                debug!("Keeping {}", raw.path.display());
                retained += 1;
            } else {
                debug!("No processed file for {}", raw.path.display());
                orphans.push(OrphanCandidate {
                    path: raw.path,
                    base_name,
                });
            }
        }

        Ok((orphans, retained))
    }

    /// Deletes every raw file in `raw_dir` with no same-named processed file
    /// in `processed_dir`.
    ///
    /// A failed deletion is recorded in the report and the pass carries on
    /// with the remaining files.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Filesystem` if either directory cannot be read.
    /// Nothing is deleted in that case.
    pub fn prune_orphan_raws(&self, processed_dir: &Path, raw_dir: &Path) -> MediaResult<PruneReport> {
        let (orphans, retained) = self.find_orphans(processed_dir, raw_dir)?;
        let mut report = self.delete_orphans(&orphans);
        report.retained = retained;

        info!(
            "Examined {} raw files: {} orphaned, {} deleted, {} failed, {} kept",
            report.total_examined(),
            report.orphans.len(),
            report.deleted.len(),
            report.failed.len(),
            report.retained
        );
        Ok(report)
    }

    /// Deletes each of `orphans` in turn. A failure is recorded and the
    /// remaining files are still attempted. In dry-run mode nothing is
    /// removed.
    pub fn delete_orphans(&self, orphans: &[OrphanCandidate]) -> PruneReport {
        let mut report = PruneReport {
            orphans: orphans.to_vec(),
            ..PruneReport::default()
        };

        for orphan in orphans {
            if self.dry_run {
                info!("[dry run] Would delete {}", orphan.path.display());
                continue;
            }

            match fs::remove_file(&orphan.path) {
                Ok(()) => {
                    debug!("Deleted {}", orphan.path.display());
                    report.deleted.push(orphan.path.clone());
                }
                Err(e) => {
                    let err = MediaError::fs(&orphan.path, e);
                    warn!("{}", err);
                    report.failed.push((orphan.path.clone(), err.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Dirs {
        _temp: TempDir,
        processed: PathBuf,
        raw: PathBuf,
    }

    fn setup(processed: &[&str], raw: &[&str]) -> Dirs {
        let temp = TempDir::new().unwrap();
        let processed_dir = temp.path().join("JPG");
        let raw_dir = temp.path().join("RAW");
        fs::create_dir_all(&processed_dir).unwrap();
        fs::create_dir_all(&raw_dir).unwrap();
        for name in processed {
            fs::write(processed_dir.join(name), b"jpeg").unwrap();
        }
        for name in raw {
            fs::write(raw_dir.join(name), b"raw").unwrap();
        }
        Dirs {
            _temp: temp,
            processed: processed_dir,
            raw: raw_dir,
        }
    }

    #[test]
    fn test_deletes_only_unmatched_raws() {
        let dirs = setup(&["A.JPG"], &["A.ARW", "B.ARW"]);
        let pruner = OrphanPruner::new(&Settings::default(), false);

        let report = pruner.prune_orphan_raws(&dirs.processed, &dirs.raw).unwrap();

        assert_eq!(report.deleted, vec![dirs.raw.join("B.ARW")]);
        assert_eq!(report.retained, 1);
        assert!(report.is_complete_success());
        assert!(dirs.raw.join("A.ARW").exists());
        assert!(!dirs.raw.join("B.ARW").exists());
        assert!(dirs.processed.join("A.JPG").exists());
    }

    #[test]
    fn test_dry_run_records_without_deleting() {
        let dirs = setup(&[], &["A.ARW", "B.ARW"]);
        let pruner = OrphanPruner::new(&Settings::default(), true);

        let report = pruner.prune_orphan_raws(&dirs.processed, &dirs.raw).unwrap();

        assert_eq!(report.orphans.len(), 2);
        assert!(report.deleted.is_empty());
        assert!(dirs.raw.join("A.ARW").exists());
        assert!(dirs.raw.join("B.ARW").exists());
    }

    #[test]
    fn test_base_name_must_match_exactly() {
        let dirs = setup(&["DSC00001-edit.JPG", "dsc00002.JPG"], &["DSC00001.ARW", "DSC00002.ARW"]);
        let pruner = OrphanPruner::new(&Settings::default(), true);

        let (orphans, retained) = pruner.find_orphans(&dirs.processed, &dirs.raw).unwrap();
        assert_eq!(orphans.len(), 2);
        assert_eq!(retained, 0);
    }

    #[test]
    fn test_extension_case_is_ignored() {
        let dirs = setup(&["A.jpg"], &["A.arw"]);
        let pruner = OrphanPruner::new(&Settings::default(), false);

        let report = pruner.prune_orphan_raws(&dirs.processed, &dirs.raw).unwrap();
        assert!(report.orphans.is_empty());
        assert!(dirs.raw.join("A.arw").exists());
    }

    #[test]
    fn test_other_files_are_left_alone() {
        let dirs = setup(&[], &["notes.txt", "A.ARW"]);
        let pruner = OrphanPruner::new(&Settings::default(), false);

        let report = pruner.prune_orphan_raws(&dirs.processed, &dirs.raw).unwrap();
        assert_eq!(report.deleted.len(), 1);
        assert!(dirs.raw.join("notes.txt").exists());
    }

    #[test]
    fn test_missing_processed_dir_deletes_nothing() {
        let dirs = setup(&[], &["A.ARW"]);
        fs::remove_dir(&dirs.processed).unwrap();
        let pruner = OrphanPruner::new(&Settings::default(), false);

        let result = pruner.prune_orphan_raws(&dirs.processed, &dirs.raw);
        assert!(matches!(result, Err(MediaError::Filesystem { .. })));
        assert!(dirs.raw.join("A.ARW").exists());
    }

    #[test]
    fn test_failed_deletion_does_not_stop_the_pass() {
        let dirs = setup(&[], &["B.ARW"]);
        let orphans = vec![
            OrphanCandidate {
                path: dirs.raw.join("A.ARW"),
                base_name: "A".to_string(),
            },
            OrphanCandidate {
                path: dirs.raw.join("B.ARW"),
                base_name: "B".to_string(),
            },
        ];
        let pruner = OrphanPruner::new(&Settings::default(), false);

        let report = pruner.delete_orphans(&orphans);

        assert_eq!(report.orphans.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, dirs.raw.join("A.ARW"));
        assert_eq!(report.deleted, vec![dirs.raw.join("B.ARW")]);
        assert!(!dirs.raw.join("B.ARW").exists());
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_delete_orphans_dry_run_touches_nothing() {
        let dirs = setup(&[], &["A.ARW"]);
        let orphans = vec![OrphanCandidate {
            path: dirs.raw.join("A.ARW"),
            base_name: "A".to_string(),
        }];

        let report = OrphanPruner::new(&Settings::default(), true).delete_orphans(&orphans);

        assert!(report.deleted.is_empty());
        assert!(report.failed.is_empty());
        assert!(dirs.raw.join("A.ARW").exists());
    }

    #[test]
    fn test_same_directory_for_both() {
        let dirs = setup(&[], &["A.ARW", "B.ARW"]);
        fs::write(dirs.raw.join("A.JPG"), b"jpeg").unwrap();
        let pruner = OrphanPruner::new(&Settings::default(), false);

        let report = pruner.prune_orphan_raws(&dirs.raw, &dirs.raw).unwrap();
        assert_eq!(report.deleted, vec![dirs.raw.join("B.ARW")]);
        assert!(dirs.raw.join("A.ARW").exists());
    }
}
