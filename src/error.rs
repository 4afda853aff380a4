//! Error types shared by the classifier, relocator and pruner.

use std::path::PathBuf;

/// Errors raised while planning or executing media operations.
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// The requested extension does not belong to any known category.
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// The category directory already exists and merging was not allowed.
    #[error("destination directory already exists: {}", .0.display())]
    DestinationAlreadyExists(PathBuf),

    /// A destination name collided but is not in the numeric naming format.
    #[error("cannot resolve name collision for non-sequential file name: {}", .0.display())]
    CollisionResolutionUnsupported(PathBuf),

    /// Probing for a free index ran past its bound.
    #[error("no free index found for {} within {limit} attempts", .path.display())]
    CollisionProbeExhausted { path: PathBuf, limit: usize },

    /// An OS-level failure on a specific path.
    #[error("filesystem error on {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A glob pattern built from a directory path was rejected.
    #[error("invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Execution stopped part way through a category.
    #[error("moved {moved} of {planned} files before failing: {source}")]
    MoveAborted {
        moved: usize,
        planned: usize,
        #[source]
        source: Box<MediaError>,
    },
}

impl MediaError {
    /// Wraps an I/O error together with the path it occurred on.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
