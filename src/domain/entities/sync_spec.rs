//! Sync spec entity
//!
//! One local tree (or loose file) to mirror onto the remote host.

use std::path::{Path, PathBuf};

use crate::domain::value_objects::ExcludePatterns;

/// Description of a single tree to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSpec {
    name: String,
    source: PathBuf,
    destination: String,
    exclude: ExcludePatterns,
    delete_extraneous: bool,
}

impl SyncSpec {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        let source = source.into();
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        Self {
            name,
            source,
            destination: destination.into(),
            exclude: ExcludePatterns::empty(),
            delete_extraneous: true,
        }
    }

    /// Label used in logs and events.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludePatterns) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_delete_extraneous(mut self, delete: bool) -> Self {
        self.delete_extraneous = delete;
        self
    }

    /// Point the spec at a different remote destination (after `~` resolution).
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn exclude(&self) -> &ExcludePatterns {
        &self.exclude
    }

    pub fn delete_extraneous(&self) -> bool {
        self.delete_extraneous
    }

    /// Whether the source is a single file rather than a directory tree.
    pub fn is_single_file(&self) -> bool {
        self.source.is_file()
    }
}
