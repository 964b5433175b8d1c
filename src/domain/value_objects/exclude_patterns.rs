//! Exclude patterns value object
//!
//! Matches paths relative to a tree root against a [`SyncSpec`]'s exclude list
//! using gitignore semantics. The same matcher decides what is copied and what
//! may be deleted as extraneous, so an excluded path is never touched on
//! either side.
//!
//! [`SyncSpec`]: crate::domain::entities::SyncSpec

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fmt;
use std::path::Path;

/// Maximum number of patterns allowed per tree
const MAX_PATTERNS: usize = 1000;

/// Compiled exclude rules for one synchronized tree.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    matcher: Gitignore,
    raw: Vec<String>,
}

impl Default for ExcludePatterns {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExcludePatterns {
    /// Create an empty pattern set (matches nothing).
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            raw: Vec::new(),
        }
    }

    /// Compile a list of glob patterns.
    ///
    /// Blank entries and `#` comments are skipped, mirroring gitignore files.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ExcludeError> {
        let mut builder = GitignoreBuilder::new("");
        let mut raw = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }

            raw.push(pattern.to_string());
            if raw.len() > MAX_PATTERNS {
                return Err(ExcludeError::TooManyPatterns {
                    count: raw.len(),
                    limit: MAX_PATTERNS,
                });
            }

            builder
                .add_line(None, pattern)
                .map_err(|e| ExcludeError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
        }

        let matcher = builder
            .build()
            .map_err(|e| ExcludeError::BuildFailed(e.to_string()))?;

        Ok(Self { matcher, raw })
    }

    /// Check whether a path relative to the tree root is excluded.
    ///
    /// A path is excluded if it, or any of its parent directories, matches.
    pub fn is_excluded(&self, rel_path: &Path, is_dir: bool) -> bool {
        if self.raw.is_empty() || rel_path.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    /// The patterns as written, in order (handed to rsync as `--exclude`).
    pub fn patterns(&self) -> &[String] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl PartialEq for ExcludePatterns {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ExcludePatterns {}

/// Errors that can occur when compiling exclude patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeError {
    TooManyPatterns { count: usize, limit: usize },
    InvalidPattern { pattern: String, message: String },
    BuildFailed(String),
}

impl fmt::Display for ExcludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyPatterns { count, limit } => {
                write!(f, "{} exclude patterns exceed the limit of {}", count, limit)
            }
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid exclude pattern '{}': {}", pattern, message)
            }
            Self::BuildFailed(msg) => write!(f, "failed to build exclude matcher: {}", msg),
        }
    }
}

impl std::error::Error for ExcludeError {}
