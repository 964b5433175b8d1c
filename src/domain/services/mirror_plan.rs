//! Mirror planning
//!
//! Given the local tree, the current remote tree and the exclude rules,
//! decide what has to be copied and what has to be deleted so that the
//! destination ends up mirroring the source. Used by transports that cannot
//! compute this themselves (scp); rsync applies the same rules natively.
//!
//! Exclusion is symmetric: an excluded path is neither copied nor deleted,
//! whichever side it appears on.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::domain::value_objects::ExcludePatterns;

/// Files and directories of a tree, relative to its root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    pub files: BTreeSet<PathBuf>,
    pub dirs: BTreeSet<PathBuf>,
}

impl TreeListing {
    /// Walk a local directory tree. Nothing is filtered here (no gitignore,
    /// hidden files included); exclusion is the plan's job.
    pub fn scan_local(root: &Path) -> io::Result<Self> {
        let mut listing = Self::default();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
                _ => continue,
            };
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                listing.dirs.insert(rel);
            } else {
                listing.files.insert(rel);
            }
        }

        Ok(listing)
    }

    /// Parse the `d ./path` / `f ./path` lines produced by the remote lister.
    pub fn parse_remote(output: &str) -> Self {
        let mut listing = Self::default();
        for line in output.lines() {
            let (kind, path) = match line.split_once(' ') {
                Some(parts) => parts,
                None => continue,
            };
            let path = path.trim_start_matches("./");
            if path.is_empty() || path == "." {
                continue;
            }
            match kind {
                "d" => {
                    listing.dirs.insert(PathBuf::from(path));
                }
                "f" => {
                    listing.files.insert(PathBuf::from(path));
                }
                _ => {}
            }
        }
        listing
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// What a transport must do to mirror one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorPlan {
    /// Local files to transfer, sorted
    pub copy_files: Vec<PathBuf>,
    /// Directories that must exist at the destination, parents first
    pub copy_dirs: Vec<PathBuf>,
    /// Remote files to remove
    pub delete_files: Vec<PathBuf>,
    /// Remote directories to remove once emptied, deepest first
    pub delete_dirs: Vec<PathBuf>,
}

impl MirrorPlan {
    pub fn compute(
        local: &TreeListing,
        remote: &TreeListing,
        exclude: &ExcludePatterns,
        delete_extraneous: bool,
    ) -> Self {
        let copy_files: Vec<PathBuf> = local
            .files
            .iter()
            .filter(|p| !exclude.is_excluded(p, false))
            .cloned()
            .collect();

        let copy_dirs: Vec<PathBuf> = local
            .dirs
            .iter()
            .filter(|p| !exclude.is_excluded(p, true))
            .cloned()
            .collect();

        let (delete_files, mut delete_dirs) = if delete_extraneous {
            let files = remote
                .files
                .iter()
                .filter(|p| !local.files.contains(*p))
                .filter(|p| !exclude.is_excluded(p, false))
                .cloned()
                .collect();
            let dirs: Vec<PathBuf> = remote
                .dirs
                .iter()
                .filter(|p| !local.dirs.contains(*p))
                .filter(|p| !exclude.is_excluded(p, true))
                .cloned()
                .collect();
            (files, dirs)
        } else {
            (Vec::new(), Vec::new())
        };

        delete_dirs.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });

        Self {
            copy_files,
            copy_dirs,
            delete_files,
            delete_dirs,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.copy_files.is_empty()
            && self.copy_dirs.is_empty()
            && self.delete_files.is_empty()
            && self.delete_dirs.is_empty()
    }
}
