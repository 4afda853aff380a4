//! Directory enumeration by extension.
//!
//! Files are found with `glob` patterns matched case-insensitively, so a
//! request for `JPG` also picks up `photo.jpg`. Results come back in the
//! sorted order `glob` walks the tree, which is the discovery order used to
//! break modification-time ties.

use crate::error::{MediaError, MediaResult};
use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A media file found under a source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Full path of the file as found.
    pub path: PathBuf,
    /// Extension exactly as it appears on disk.
    pub extension: String,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Position in discovery order.
    pub discovery_index: usize,
}

impl SourceFile {
    /// File name without its directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// File name without directory or extension.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// True if any component of `path` below `root` starts with a dot, such as
/// `._DSC00001.JPG` or `.Trashes/501/DSC09999.JPG`.
fn is_hidden_below(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// Builds the glob pattern for `*.ext` under `root`, descending into
/// subdirectories when `recursive` is set.
fn extension_pattern(root: &Path, extension: &str, recursive: bool) -> MediaResult<String> {
    let root_str = root.to_str().ok_or_else(|| MediaError::InvalidPattern {
        pattern: root.to_string_lossy().to_string(),
        reason: "path is not valid UTF-8".to_string(),
    })?;

    let mut pattern = Pattern::escape(root_str.trim_end_matches('/'));
    if recursive {
        pattern.push_str("/**");
    }
    pattern.push_str("/*.");
    pattern.push_str(&Pattern::escape(extension));
    Ok(pattern)
}

/// Finds every regular file with `extension` under `root`.
///
/// # Errors
///
/// Returns `MediaError::Filesystem` if `root` is not a readable directory,
/// if a subdirectory cannot be read, or if a file cannot be stat'ed.
pub fn find_by_extension(
    root: &Path,
    extension: &str,
    recursive: bool,
) -> MediaResult<Vec<SourceFile>> {
    let meta = fs::metadata(root).map_err(|e| MediaError::fs(root, e))?;
    if !meta.is_dir() {
        return Err(MediaError::fs(
            root,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let pattern = extension_pattern(root, extension, recursive)?;
    debug!("Scanning with pattern {}", pattern);

    let entries = glob::glob_with(&pattern, MATCH_OPTIONS).map_err(|e| {
        MediaError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.msg.to_string(),
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            MediaError::fs(path, std::io::Error::from(e))
        })?;
        if is_hidden_below(root, &path) {
            debug!("Skipping hidden {}", path.display());
            continue;
        }

        let metadata = fs::metadata(&path).map_err(|e| MediaError::fs(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(|e| MediaError::fs(&path, e))?;
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!("Found {}", path.display());
        files.push(SourceFile {
            discovery_index: files.len(),
            path,
            extension,
            modified: DateTime::<Utc>::from(modified),
        });
    }

    Ok(files)
}

/// Returns every file name that occurs more than once, with its count,
/// sorted by name.
pub fn duplicate_names(files: &[SourceFile]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in files {
        *counts.entry(file.file_name()).or_insert(0) += 1;
    }
    counts.into_iter().filter(|(_, count)| *count > 1).collect()
}
