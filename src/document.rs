//! Loading and saving the target document.
//!
//! A document is read fully into memory as UTF-8 and written back in one go.
//! Writes go through a temp file in the same directory so a failed write
//! leaves the previous contents in place.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    content: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read the whole file at `path` as UTF-8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let content = String::from_utf8(bytes).map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "loaded document");

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// Replace the content, keeping the path.
    pub fn with_content(self, content: String) -> Self {
        Self {
            path: self.path,
            content,
        }
    }

    /// Write the document back to the path it was loaded from.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// Overwrite `path` with the document content.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| Error::io(parent_dir, e))?;
        temp_file
            .write_all(self.content.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|e| Error::io(temp_file.path(), e))?;

        // Carry over the original permissions; the temp file is created 0600
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp_file.path(), metadata.permissions())
                .map_err(|e| Error::io(temp_file.path(), e))?;
        }

        temp_file
            .persist(path)
            .map_err(|e| Error::io(path, e.error))?;

        tracing::debug!(path = %path.display(), bytes = self.content.len(), "saved document");
        Ok(())
    }
}
