//! Directory partitioning.
//!
//! Decides which directories get a feed. The layout is deliberately flat:
//!
//! ```text
//! /media/usb0/                 → mrss.xml
//! ├── video1.mp4
//! ├── promo/                   → promo.xml   (written at the root)
//! │   ├── ad1.mov
//! │   └── old/                 (not a target: depth 2)
//! └── .Trashes/                (hidden, not a target)
//! ```
//!
//! The scan root is always a target. Every visible immediate subdirectory is
//! a target. Nothing deeper is.

use crate::feed::EntryOrder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Feed filename for the scan root.
pub const ROOT_FEED_NAME: &str = "mrss.xml";

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("Scan root does not exist: {0}")]
    RootMissing(PathBuf),
    #[error("Scan root is not a directory: {0}")]
    RootNotDirectory(PathBuf),
    #[error("Cannot list scan root {0}: {1}")]
    Walk(PathBuf, #[source] walkdir::Error),
}

/// A directory slated to receive its own feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTarget {
    /// Directory whose immediate files become feed entries.
    pub dir: PathBuf,
    /// Output filename, relative to the scan root.
    pub feed_name: String,
    /// Path of `dir` relative to the scan root with a trailing `/`, or empty
    /// for the root itself. Prepended to filenames to build URLs.
    pub url_prefix: String,
}

impl DirectoryTarget {
    pub fn root(root: &Path) -> Self {
        Self {
            dir: root.to_path_buf(),
            feed_name: ROOT_FEED_NAME.to_string(),
            url_prefix: String::new(),
        }
    }

    pub fn subdirectory(root: &Path, name: &str) -> Self {
        Self::at(root.join(name), name)
    }

    /// Target for the directory at `dir`, named `name` in URLs and the feed
    /// filename. `name` may be a lossy rendering of the on-disk name; `dir`
    /// is kept as-is so the directory can still be read.
    pub fn at(dir: PathBuf, name: &str) -> Self {
        Self {
            dir,
            feed_name: format!("{name}.xml"),
            url_prefix: format!("{name}/"),
        }
    }

    pub fn is_root(&self) -> bool {
        self.url_prefix.is_empty()
    }

    /// Where the feed for this target is written.
    pub fn feed_path(&self, root: &Path) -> PathBuf {
        root.join(&self.feed_name)
    }
}

/// Entries starting with `.` (`.Trashes`, `.Spotlight-V100`, `._clip.mp4`).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Fail unless `root` is an existing directory.
pub fn check_root(root: &Path) -> Result<(), PartitionError> {
    if !root.exists() {
        return Err(PartitionError::RootMissing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(PartitionError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Enumerate the feed targets under `root`: the root first, then each
/// visible immediate subdirectory.
pub fn partition(root: &Path, order: EntryOrder) -> Result<Vec<DirectoryTarget>, PartitionError> {
    check_root(root)?;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);
    let walker = match order {
        EntryOrder::Filesystem => walker,
        EntryOrder::Name => walker.sort_by_file_name(),
    };

    let mut targets = vec![DirectoryTarget::root(root)];
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself being unreadable is fatal; a single broken
            // child (dangling symlink, permission) is just not a target.
            Err(e) if e.depth() == 0 => {
                return Err(PartitionError::Walk(root.to_path_buf(), e));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_hidden(&name) {
            continue;
        }
        targets.push(DirectoryTarget::at(entry.path().to_path_buf(), &name));
    }

    Ok(targets)
}
