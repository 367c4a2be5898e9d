//! Run orchestration.
//!
//! One call to [`run`] is one full regeneration of every feed under a scan
//! root:
//!
//! ```text
//! resolve config ─┐
//!                 ├─→ for each target: build feed → write feed
//! partition ──────┘
//! ```
//!
//! Failures are contained at the smallest level that can absorb them. A bad
//! config falls back to defaults, an unreadable file drops out of its feed,
//! and an unreadable directory or failed write loses that one feed. Only a
//! missing or non-directory scan root stops the run.

use crate::config::{self, Config, ConfigSource};
use crate::feed::{self, EntryOrder, FeedError, SkippedFile};
use crate::partition::{self, DirectoryTarget, PartitionError, ROOT_FEED_NAME};
use crate::writer::{self, WriteError};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

/// Why a single directory produced no feed.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error(transparent)]
    Build(#[from] FeedError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("Feed name {0} is reserved for the scan root")]
    FeedNameCollision(String),
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Defaults the user's `config.json` is overlaid on.
    pub defaults: Config,
    pub order: EntryOrder,
    /// When false, feeds are built and reported but nothing is written.
    pub write: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            defaults: Config::default(),
            order: EntryOrder::default(),
            write: true,
        }
    }
}

/// A feed that was produced (or would have been, for a dry run).
#[derive(Debug)]
pub struct FeedOutcome {
    pub target: DirectoryTarget,
    pub path: PathBuf,
    pub entry_count: usize,
    pub skipped: Vec<SkippedFile>,
    pub written: bool,
}

/// A directory whose feed was not produced.
#[derive(Debug)]
pub struct DirectoryFailure {
    pub target: DirectoryTarget,
    pub error: DirectoryError,
}

/// Everything the invoking hook needs to know about a run.
#[derive(Debug)]
pub struct RunReport {
    pub root: PathBuf,
    pub config: Config,
    pub config_source: ConfigSource,
    pub published_at: DateTime<Utc>,
    pub feeds: Vec<FeedOutcome>,
    pub failures: Vec<DirectoryFailure>,
    /// Feeds were built but not written.
    pub dry_run: bool,
}

impl RunReport {
    /// True when every target produced a feed.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn skipped_files(&self) -> impl Iterator<Item = &SkippedFile> {
        self.feeds.iter().flat_map(|f| f.skipped.iter())
    }
}

fn process_target(
    root: &Path,
    target: &DirectoryTarget,
    config: &Config,
    published_at: DateTime<Utc>,
    options: &RunOptions,
) -> Result<FeedOutcome, DirectoryError> {
    // Removable media is usually FAT/exFAT, where `MRSS.xml` is `mrss.xml`.
    if !target.is_root() && target.feed_name.eq_ignore_ascii_case(ROOT_FEED_NAME) {
        return Err(DirectoryError::FeedNameCollision(target.feed_name.clone()));
    }

    let build = feed::build_feed(target, config, published_at, options.order)?;
    let path = target.feed_path(root);
    if options.write {
        writer::write_feed(&build.document, &path)?;
        tracing::info!(
            feed = %path.display(),
            entries = build.document.entries.len(),
            "wrote feed"
        );
    }

    Ok(FeedOutcome {
        target: target.clone(),
        path,
        entry_count: build.document.entries.len(),
        skipped: build.skipped,
        written: options.write,
    })
}

/// Regenerate every feed under `root`.
pub fn run(root: &Path, options: &RunOptions) -> Result<RunReport, PipelineError> {
    partition::check_root(root)?;

    let resolved = config::resolve_config(root, &options.defaults);
    let targets = partition::partition(root, options.order)?;
    let published_at = Utc::now();

    let mut feeds = Vec::new();
    let mut failures = Vec::new();
    for target in targets {
        match process_target(root, &target, &resolved.config, published_at, options) {
            Ok(outcome) => feeds.push(outcome),
            Err(error) => {
                tracing::warn!(dir = %target.dir.display(), %error, "skipping directory");
                failures.push(DirectoryFailure { target, error });
            }
        }
    }

    Ok(RunReport {
        root: root.to_path_buf(),
        config: resolved.config,
        config_source: resolved.source,
        published_at,
        feeds,
        failures,
        dry_run: !options.write,
    })
}
