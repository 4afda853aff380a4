//! camsort - camera media sorting and cleanup
//!
//! This library sorts the files a camera writes (processed images, raw
//! images and movie clips) into category directories, renames them into a
//! sequential scheme ordered by modification time, and prunes raw files that
//! have no processed counterpart.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod logging;
pub mod output;
pub mod pruner;
pub mod relocator;
pub mod scan;

pub use config::{ConfigError, NamingScheme, Settings};
pub use error::{MediaError, MediaResult};
pub use file_category::{Classifier, ExtensionCategory};
pub use pruner::{OrphanCandidate, OrphanPruner, PruneReport};
pub use relocator::{DestinationSlot, PlannedMove, RelocationPlan, Relocator};
pub use scan::SourceFile;

pub use cli::{Command, RunOptions, run_command};
