//! mdtrim: remove a duplicated section from a Markdown file
//!
//! This library exposes mdtrim's core functionality for use in property-based tests.
//! The main binary is at src/main.rs.

pub mod backup_manager;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod diff_formatter;
pub mod document;
pub mod error;
pub mod error_helpers;
pub mod logger;

// Re-export commonly used types for convenience
pub use backup_manager::{BackupManager, BackupMetadata, FileBackup};
pub use dedup::{deduplicate, Deduplication, Pattern, RemovedSpan, Scope};
pub use document::Document;
pub use error::{Error, Result};
