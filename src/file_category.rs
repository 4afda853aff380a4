//! Extension classification for camera media.
//!
//! Each recognized extension maps to exactly one category and each category
//! to exactly one directory under the destination root. The mapping is
//! total over the three categories; anything else is rejected.
//!
//! # Examples
//!
//! ```
//! use camsort::file_category::{Classifier, ExtensionCategory};
//! use std::path::Path;
//!
//! let classifier = Classifier::default();
//! let (category, dir) = classifier.classify("arw", Path::new("/backup")).unwrap();
//! assert_eq!(category, ExtensionCategory::RawImage);
//! assert_eq!(dir, Path::new("/backup/Photos/RAW"));
//! ```

use crate::config::{Extensions, Layout, Settings};
use crate::error::{MediaError, MediaResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The kinds of file a camera produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionCategory {
    /// In-camera JPEG output.
    ProcessedImage,
    /// Unprocessed sensor data.
    RawImage,
    /// Movie clips.
    Video,
}

impl ExtensionCategory {
    /// All categories, in the order a reorganization processes them.
    pub const ALL: [ExtensionCategory; 3] = [
        ExtensionCategory::ProcessedImage,
        ExtensionCategory::RawImage,
        ExtensionCategory::Video,
    ];

    /// Returns a human-readable label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            ExtensionCategory::ProcessedImage => "processed images",
            ExtensionCategory::RawImage => "raw images",
            ExtensionCategory::Video => "videos",
        }
    }
}

/// Maps extensions to categories and categories to destination directories.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    layout: Layout,
    extensions: Extensions,
}

impl Classifier {
    /// Creates a classifier from the layout and extensions in `settings`.
    pub fn new(settings: &Settings) -> Self {
        Self {
            layout: settings.layout.clone(),
            extensions: settings.extensions.clone(),
        }
    }

    /// Looks up the category for an extension, ignoring ASCII case and a
    /// leading dot.
    pub fn category_of(&self, extension: &str) -> MediaResult<ExtensionCategory> {
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        ExtensionCategory::ALL
            .into_iter()
            .find(|category| self.extension_for(*category).eq_ignore_ascii_case(ext))
            .ok_or_else(|| MediaError::UnsupportedExtension(extension.to_string()))
    }

    /// Returns the extension recognized for `category`.
    pub fn extension_for(&self, category: ExtensionCategory) -> &str {
        match category {
            ExtensionCategory::ProcessedImage => &self.extensions.processed,
            ExtensionCategory::RawImage => &self.extensions.raw,
            ExtensionCategory::Video => &self.extensions.video,
        }
    }

    /// Returns the directory for `category` under `dest_root`.
    pub fn destination_dir(&self, category: ExtensionCategory, dest_root: &Path) -> PathBuf {
        match category {
            ExtensionCategory::ProcessedImage => dest_root
                .join(&self.layout.photos_dir)
                .join(&self.layout.processed_subdir),
            ExtensionCategory::RawImage => dest_root
                .join(&self.layout.photos_dir)
                .join(&self.layout.raw_subdir),
            ExtensionCategory::Video => dest_root.join(&self.layout.movies_dir),
        }
    }

    /// Resolves an extension to its category and destination directory.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnsupportedExtension` if the extension belongs to
    /// none of the three categories.
    pub fn classify(
        &self,
        extension: &str,
        dest_root: &Path,
    ) -> MediaResult<(ExtensionCategory, PathBuf)> {
        let category = self.category_of(extension)?;
        Ok((category, self.destination_dir(category, dest_root)))
    }
}
