//! Layout, extension and relocation settings.
//!
//! Settings are read from an optional TOML file. Every key has a default, so
//! an empty file (or no file at all) yields the stock Sony Alpha layout:
//!
//! ```toml
//! [layout]
//! photos_dir = "Photos"
//! processed_subdir = "JPG"
//! raw_subdir = "RAW"
//! movies_dir = "Movies"
//!
//! [extensions]
//! processed = "JPG"
//! raw = "ARW"
//! video = "MTS"
//!
//! [relocation]
//! allow_existing_destination = false
//! index_width = 5
//! naming = "sequential"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur while loading or validating settings.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A value parsed fine but is not usable.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// How relocated files are named inside their category directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// Zero-padded counter ordered by modification time (`00001.JPG`).
    #[default]
    Sequential,
    /// Keep the name the camera assigned (`DSC01234.JPG`).
    Original,
}

/// Complete tool settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub extensions: Extensions,
    #[serde(default)]
    pub relocation: RelocationSettings,
}

/// Destination directory names, relative to the destination root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub photos_dir: String,
    pub processed_subdir: String,
    pub raw_subdir: String,
    pub movies_dir: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            photos_dir: "Photos".to_string(),
            processed_subdir: "JPG".to_string(),
            raw_subdir: "RAW".to_string(),
            movies_dir: "Movies".to_string(),
        }
    }
}

/// The file extension recognized for each category, without the dot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extensions {
    pub processed: String,
    pub raw: String,
    pub video: String,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            processed: "JPG".to_string(),
            raw: "ARW".to_string(),
            video: "MTS".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocationSettings {
    /// Merge into category directories left by an earlier run.
    pub allow_existing_destination: bool,
    /// Digits in a sequential file name.
    pub index_width: usize,
    pub naming: NamingScheme,
}

impl Default for RelocationSettings {
    fn default() -> Self {
        Self {
            allow_existing_destination: false,
            index_width: 5,
            naming: NamingScheme::Sequential,
        }
    }
}

impl Settings {
    /// Load settings, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.camsortrc.toml` in the current directory
    /// 3. Look for `~/.config/camsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read, or if
    /// any file that is found fails to parse or validate.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".camsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("camsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file and validate them.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the settings describe a usable, unambiguous layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let extensions = [
            ("extensions.processed", &self.extensions.processed),
            ("extensions.raw", &self.extensions.raw),
            ("extensions.video", &self.extensions.video),
        ];
        for (key, ext) in extensions {
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("'{}' is not a plain alphanumeric extension", ext),
                });
            }
        }
        for (i, (key, ext)) in extensions.iter().enumerate() {
            if extensions[..i]
                .iter()
                .any(|(_, other)| other.eq_ignore_ascii_case(ext))
            {
                return Err(ConfigError::InvalidValue {
                    key: *key,
                    reason: format!("'{}' is already used by another category", ext),
                });
            }
        }

        let dirs = [
            ("layout.photos_dir", &self.layout.photos_dir),
            ("layout.processed_subdir", &self.layout.processed_subdir),
            ("layout.raw_subdir", &self.layout.raw_subdir),
            ("layout.movies_dir", &self.layout.movies_dir),
        ];
        for (key, dir) in dirs {
            if !is_single_component(dir) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("'{}' must be a single directory name", dir),
                });
            }
        }

        if self.layout.processed_subdir == self.layout.raw_subdir {
            return Err(ConfigError::InvalidValue {
                key: "layout.raw_subdir",
                reason: "processed and raw images need separate directories".to_string(),
            });
        }
        if self.layout.photos_dir == self.layout.movies_dir {
            return Err(ConfigError::InvalidValue {
                key: "layout.movies_dir",
                reason: "photos and movies need separate directories".to_string(),
            });
        }

        if !(1..=12).contains(&self.relocation.index_width) {
            return Err(ConfigError::InvalidValue {
                key: "relocation.index_width",
                reason: format!("{} is outside 1..=12", self.relocation.index_width),
            });
        }

        Ok(())
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
