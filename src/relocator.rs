/// Relocation of camera media into numbered category directories.
///
/// A relocation runs in two phases. Planning enumerates the source tree,
/// orders files by modification time, assigns destination names and
/// resolves collisions without touching the filesystem. Execution then
/// performs the moves in plan order, stopping at the first failure.
use crate::config::{NamingScheme, RelocationSettings, Settings};
use crate::error::{MediaError, MediaResult};
use crate::file_category::{Classifier, ExtensionCategory};
use crate::scan::{self, SourceFile};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

static SEQUENTIAL_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("static regex is valid"));

/// Where a source file is going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationSlot {
    /// Sequential index, or `None` when the original name is kept.
    pub index: Option<u64>,
    pub path: PathBuf,
}

/// One source file paired with its destination.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedMove {
    pub source: SourceFile,
    pub destination: DestinationSlot,
    /// The first-choice destination was taken and a later index was used.
    pub collided: bool,
}

/// A file name found in more than one source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateName {
    pub name: String,
    pub count: usize,
}

/// The full set of moves for one category, computed before any mutation.
#[derive(Debug, Clone, Serialize)]
pub struct RelocationPlan {
    pub category: ExtensionCategory,
    pub extension: String,
    pub destination_dir: PathBuf,
    /// The destination directory does not exist yet.
    pub create_destination: bool,
    pub moves: Vec<PlannedMove>,
    pub duplicates: Vec<DuplicateName>,
}

impl RelocationPlan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }
}

/// Returns the path with the numeric file stem of `candidate` increased by
/// one, keeping its zero padding.
///
/// # Errors
///
/// Returns `MediaError::CollisionResolutionUnsupported` if the stem is not
/// purely numeric.
pub fn increment_index(candidate: &Path) -> MediaResult<PathBuf> {
    let stem = candidate
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| SEQUENTIAL_STEM.is_match(s))
        .ok_or_else(|| MediaError::CollisionResolutionUnsupported(candidate.to_path_buf()))?;

    let index: u64 = stem
        .parse()
        .map_err(|_| MediaError::CollisionResolutionUnsupported(candidate.to_path_buf()))?;
    let next = format!("{:0width$}", index + 1, width = stem.len());

    let file_name = match candidate.extension() {
        Some(ext) => format!("{}.{}", next, ext.to_string_lossy()),
        None => next,
    };
    Ok(candidate.with_file_name(file_name))
}

/// Probes for the first free path at or after `candidate`.
///
/// At most `limit` increments are attempted. With `limit` set to the number
/// of names that can possibly be taken, the probe always succeeds.
pub fn next_free_path(
    candidate: &Path,
    is_taken: impl Fn(&Path) -> bool,
    limit: usize,
) -> MediaResult<PathBuf> {
    let mut current = candidate.to_path_buf();
    for _ in 0..=limit {
        if !is_taken(&current) {
            return Ok(current);
        }
        current = increment_index(&current)?;
    }
    Err(MediaError::CollisionProbeExhausted {
        path: candidate.to_path_buf(),
        limit,
    })
}

/// Plans and performs relocations for one category at a time.
#[derive(Debug, Clone)]
pub struct Relocator {
    classifier: Classifier,
    settings: RelocationSettings,
    dry_run: bool,
}

impl Relocator {
    pub fn new(settings: &Settings, dry_run: bool) -> Self {
        Self {
            classifier: Classifier::new(settings),
            settings: settings.relocation.clone(),
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Plans the relocation of every `extension` file under `source_root`.
    ///
    /// Nothing on disk is changed.
    ///
    /// # Errors
    ///
    /// * `UnsupportedExtension` if `extension` has no category
    /// * `DestinationAlreadyExists` if the category directory exists and
    ///   merging is disabled
    /// * `CollisionResolutionUnsupported` if a kept camera name collides
    /// * `Filesystem` if the source tree or destination cannot be read
    pub fn plan(
        &self,
        source_root: &Path,
        destination_root: &Path,
        extension: &str,
    ) -> MediaResult<RelocationPlan> {
        let (category, destination_dir) = self.classifier.classify(extension, destination_root)?;
        debug!(
            "Planning {} from {} into {}",
            category.label(),
            source_root.display(),
            destination_dir.display()
        );

        let destination_exists = destination_dir.exists();
        if destination_exists && !self.settings.allow_existing_destination {
            return Err(MediaError::DestinationAlreadyExists(destination_dir));
        }

        let mut files = scan::find_by_extension(source_root, extension, true)?;

        let duplicates: Vec<DuplicateName> = scan::duplicate_names(&files)
            .into_iter()
            .map(|(name, count)| DuplicateName { name, count })
            .collect();
        for dup in &duplicates {
            warn!(
                "File name {} appears {} times in {}",
                dup.name,
                dup.count,
                source_root.display()
            );
        }

        files.sort_by_key(|file| file.modified);

        // Names already in the directory plus names handed out by this plan.
        let mut occupied = if destination_exists {
            existing_slots(&destination_dir)?
        } else {
            HashSet::new()
        };

        let mut moves = Vec::with_capacity(files.len());
        for (position, source) in files.into_iter().enumerate() {
            let (first_choice, index) = match self.settings.naming {
                NamingScheme::Sequential => {
                    let index = position as u64 + 1;
                    let name = format!(
                        "{:0width$}.{}",
                        index,
                        source.extension,
                        width = self.settings.index_width
                    );
                    (destination_dir.join(name), Some(index))
                }
                NamingScheme::Original => (destination_dir.join(source.file_name()), None),
            };

            let is_taken =
                |path: &Path| slot_key(path).is_some_and(|key| occupied.contains(&key));
            let limit = occupied.len() + 1;

            let resolved = if is_taken(&first_choice) {
                if index.is_none() {
                    return Err(MediaError::CollisionResolutionUnsupported(first_choice));
                }
                next_free_path(&first_choice, is_taken, limit)?
            } else {
                first_choice.clone()
            };

            let collided = resolved != first_choice;
            if collided {
                debug!(
                    "{} is taken, using {}",
                    first_choice.display(),
                    resolved.display()
                );
            }

            let index = match index {
                Some(_) => resolved
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse().ok()),
                None => None,
            };

            if let Some(key) = slot_key(&resolved) {
                occupied.insert(key);
            }
            moves.push(PlannedMove {
                source,
                destination: DestinationSlot {
                    index,
                    path: resolved,
                },
                collided,
            });
        }

        Ok(RelocationPlan {
            category,
            extension: extension.to_string(),
            create_destination: !destination_exists,
            destination_dir,
            moves,
            duplicates,
        })
    }

    /// Executes `plan`, calling `on_moved` after each successful move.
    ///
    /// In dry-run mode every move is logged and nothing is touched. Returns
    /// the number of files moved.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::MoveAborted` wrapping the first filesystem error.
    /// Files moved before the failure stay where they are.
    pub fn execute_with_progress(
        &self,
        plan: &RelocationPlan,
        mut on_moved: impl FnMut(&PlannedMove),
    ) -> MediaResult<usize> {
        if self.dry_run {
            for mv in &plan.moves {
                info!(
                    "[dry run] {} -> {}",
                    mv.source.path.display(),
                    mv.destination.path.display()
                );
            }
            return Ok(0);
        }

        if plan.is_empty() {
            return Ok(0);
        }

        let abort = |moved: usize, source: MediaError| MediaError::MoveAborted {
            moved,
            planned: plan.len(),
            source: Box::new(source),
        };

        if !plan.destination_dir.exists() {
            fs::create_dir_all(&plan.destination_dir)
                .map_err(|e| abort(0, MediaError::fs(&plan.destination_dir, e)))?;
            debug!("Created {}", plan.destination_dir.display());
        }

        for (moved, mv) in plan.moves.iter().enumerate() {
            if let Err(e) = move_file(&mv.source.path, &mv.destination.path) {
                error!(
                    "Failed to move {} -> {}: {}",
                    mv.source.path.display(),
                    mv.destination.path.display(),
                    e
                );
                error!(
                    "{} of {} {} were moved; the remaining {} stay in place",
                    moved,
                    plan.len(),
                    plan.category.label(),
                    plan.len() - moved
                );
                return Err(abort(moved, e));
            }
            debug!(
                "Moved {} -> {}",
                mv.source.path.display(),
                mv.destination.path.display()
            );
            on_moved(mv);
        }

        Ok(plan.len())
    }

    /// Executes `plan` without progress reporting.
    pub fn execute(&self, plan: &RelocationPlan) -> MediaResult<usize> {
        self.execute_with_progress(plan, |_| {})
    }

    /// Plans and executes the relocation of one extension, returning the
    /// plan that was carried out.
    pub fn relocate(
        &self,
        source_root: &Path,
        destination_root: &Path,
        extension: &str,
    ) -> MediaResult<RelocationPlan> {
        let plan = self.plan(source_root, destination_root, extension)?;
        self.execute(&plan)?;
        Ok(plan)
    }
}

/// Occupancy key for a destination name. Extensions are matched without
/// regard to case elsewhere, so `00001.JPG` and `00001.jpg` share a slot.
fn slot_key(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
}

fn existing_slots(dir: &Path) -> MediaResult<HashSet<String>> {
    let entries = fs::read_dir(dir).map_err(|e| MediaError::fs(dir, e))?;
    let mut slots = HashSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| MediaError::fs(dir, e))?;
        if let Some(key) = slot_key(&entry.path()) {
            slots.insert(key);
        }
    }
    Ok(slots)
}

/// Moves a single file, never replacing an existing destination.
///
/// Falls back to copy and remove when source and destination live on
/// different filesystems.
fn move_file(source: &Path, destination: &Path) -> MediaResult<()> {
    if destination.exists() {
        return Err(MediaError::fs(
            destination,
            io::Error::new(io::ErrorKind::AlreadyExists, "destination file exists"),
        ));
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination)
        }
        Err(e) => Err(MediaError::fs(source, e)),
    }
}

/// Copies `source` to a new file at `destination`, then removes `source`.
///
/// A failed copy removes the partial destination and leaves `source` alone.
/// Permissions and modification time are carried over.
fn copy_then_remove(source: &Path, destination: &Path) -> MediaResult<()> {
    let mut reader = File::open(source).map_err(|e| MediaError::fs(source, e))?;
    let metadata = reader.metadata().map_err(|e| MediaError::fs(source, e))?;
    let mut writer = File::create_new(destination).map_err(|e| MediaError::fs(destination, e))?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.set_permissions(metadata.permissions()))
        .and_then(|_| metadata.modified())
        .and_then(|modified| writer.set_modified(modified));

    if let Err(e) = copied {
        drop(writer);
        if let Err(cleanup) = fs::remove_file(destination) {
            warn!(
                "Could not remove partial copy {}: {}",
                destination.display(),
                cleanup
            );
        }
        return Err(MediaError::fs(destination, e));
    }

    fs::remove_file(source).map_err(|e| MediaError::fs(source, e))
}
