//! Feed building.
//!
//! Turns one [`DirectoryTarget`] into an in-memory [`FeedDocument`]. Only the
//! target directory's own files are considered; files further down belong to
//! their subdirectory's feed (or to nobody, past depth 1).
//!
//! ## Entry Shape
//!
//! For `promo/ad1.mov` with content hash `abc…`:
//!
//! | Field | Value |
//! |-------|-------|
//! | `name` | `ad1` |
//! | `relative_path` | `promo/ad1.mov` |
//! | `url` | `<BASE_URL>promo/ad1.mov?md5=abc…` |
//! | `guid` | `ad1-abc…` |
//!
//! The GUID pairs the name with the fingerprint so renamed copies of the same
//! clip stay distinct while unchanged content keeps a stable identity.
//!
//! ## Partial Failure
//!
//! A file that cannot be fingerprinted is left out and reported as a
//! [`SkippedFile`]. Only an unreadable directory fails the whole feed.

use crate::config::Config;
use crate::fingerprint::{self, Fingerprint};
use crate::partition::{DirectoryTarget, is_hidden};
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Channel title shared by every feed.
pub const FEED_TITLE: &str = "MB Media";
/// Channel description shared by every feed.
pub const FEED_DESCRIPTION: &str = "MB";
/// Channel generator shared by every feed.
pub const FEED_GENERATOR: &str = "Server RSS Generator";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Cannot list {0}: {1}")]
    ReadDir(PathBuf, #[source] io::Error),
}

/// Order in which directories and files are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Whatever order the filesystem lists entries in.
    #[default]
    Filesystem,
    /// Sorted by file name, for byte-stable output across runs and machines.
    Name,
}

/// One media file in a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Filename without its extension.
    pub name: String,
    /// Path from the scan root, `/`-separated.
    pub relative_path: String,
    pub fingerprint: Fingerprint,
    /// Generation time of the run, not the file's mtime.
    pub published_at: DateTime<Utc>,
    /// Public URL: `BASE_URL + relative_path + "?md5=" + fingerprint`.
    pub url: String,
    /// MIME type announced in `media:content`.
    pub mime_type: &'static str,
}

impl MediaEntry {
    pub fn guid(&self) -> String {
        format!("{}-{}", self.name, self.fingerprint)
    }
}

/// One feed, ready to be serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub generator: String,
    pub entries: Vec<MediaEntry>,
}

impl FeedDocument {
    pub fn new(entries: Vec<MediaEntry>) -> Self {
        Self {
            title: FEED_TITLE.to_string(),
            description: FEED_DESCRIPTION.to_string(),
            generator: FEED_GENERATOR.to_string(),
            entries,
        }
    }
}

/// A media file that was left out of its feed.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Result of building one feed.
#[derive(Debug)]
pub struct FeedBuild {
    pub document: FeedDocument,
    pub skipped: Vec<SkippedFile>,
}

/// Build `BASE_URL + relative_path + "?md5=" + fingerprint`.
pub fn media_url(base_url: &str, relative_path: &str, fingerprint: &Fingerprint) -> String {
    format!("{base_url}{relative_path}?md5={fingerprint}")
}

/// MIME type for a lowercase, dot-prefixed extension.
///
/// Players only look at the `video/` prefix in practice; unknown extensions
/// are announced as MP4.
pub fn mime_type_for(ext: &str) -> &'static str {
    match ext {
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".avi" => "video/x-msvideo",
        ".mkv" => "video/x-matroska",
        ".m4v" => "video/x-m4v",
        ".webm" => "video/webm",
        _ => "video/mp4",
    }
}

/// Split `clip.final.MP4` into (`clip.final`, `.mp4`).
///
/// Names without a dot, or whose only dot is the first character, have no
/// extension.
fn split_extension(filename: &str) -> Option<(&str, String)> {
    let dot = filename.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some((&filename[..dot], filename[dot..].to_lowercase()))
}

/// Media files directly inside `dir`, as `(filename, path)` pairs.
fn collect_media_files(
    dir: &Path,
    config: &Config,
    order: EntryOrder,
) -> Result<Vec<(String, PathBuf)>, FeedError> {
    let read_dir = fs::read_dir(dir).map_err(|e| FeedError::ReadDir(dir.to_path_buf(), e))?;

    let mut files: Vec<(String, PathBuf)> = read_dir
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let path = e.path();
            // `is_file` follows symlinks, matching what a web server would serve.
            if is_hidden(&name) || !path.is_file() {
                return None;
            }
            let (_, ext) = split_extension(&name)?;
            config.is_media_extension(&ext).then_some((name, path))
        })
        .collect();

    if order == EntryOrder::Name {
        files.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(files)
}

/// Build the feed for one target.
///
/// `published_at` is captured once by the caller and stamped on every entry.
pub fn build_feed(
    target: &DirectoryTarget,
    config: &Config,
    published_at: DateTime<Utc>,
    order: EntryOrder,
) -> Result<FeedBuild, FeedError> {
    let files = collect_media_files(&target.dir, config, order)?;

    let mut entries = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for (filename, path) in files {
        let fingerprint = match fingerprint::fingerprint_file(&path) {
            Ok(fp) => fp,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable media file");
                skipped.push(SkippedFile { path, error });
                continue;
            }
        };
        tracing::debug!(path = %path.display(), %fingerprint, "fingerprinted");

        let Some((stem, ext)) = split_extension(&filename) else {
            continue;
        };
        let relative_path = format!("{}{}", target.url_prefix, filename);
        let url = media_url(&config.base_url, &relative_path, &fingerprint);

        entries.push(MediaEntry {
            name: stem.to_string(),
            relative_path,
            fingerprint,
            published_at,
            url,
            mime_type: mime_type_for(&ext),
        });
    }

    Ok(FeedBuild {
        document: FeedDocument::new(entries),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fingerprint_of, media_tree};
    use std::collections::BTreeSet;

    fn build(target: &DirectoryTarget, config: &Config) -> FeedBuild {
        build_feed(target, config, Utc::now(), EntryOrder::Name).unwrap()
    }

    fn names(build: &FeedBuild) -> Vec<&str> {
        build.document.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn root_feed_lists_root_media_only() {
        let tmp = media_tree(&[("video1.mp4", "X"), ("promo/ad1.mov", "Y")]);
        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        assert_eq!(names(&result), vec!["video1"]);
        let entry = &result.document.entries[0];
        assert_eq!(entry.relative_path, "video1.mp4");
        assert_eq!(entry.fingerprint, fingerprint_of("X"));
        assert_eq!(
            entry.url,
            format!("http://localhost/video1.mp4?md5={}", fingerprint_of("X"))
        );
    }

    #[test]
    fn subdirectory_feed_uses_prefixed_paths() {
        let tmp = media_tree(&[("video1.mp4", "X"), ("promo/ad1.mov", "Y")]);
        let target = DirectoryTarget::subdirectory(tmp.path(), "promo");
        let result = build(&target, &Config::default());

        assert_eq!(names(&result), vec!["ad1"]);
        let entry = &result.document.entries[0];
        assert_eq!(entry.relative_path, "promo/ad1.mov");
        assert_eq!(
            entry.url,
            format!("http://localhost/promo/ad1.mov?md5={}", fingerprint_of("Y"))
        );
        assert_eq!(entry.mime_type, "video/quicktime");
    }

    #[test]
    fn extensions_match_case_insensitively() {
        let tmp = media_tree(&[("A.MP4", "1"), ("b.Mkv", "2"), ("c.avi", "3")]);
        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        assert_eq!(names(&result), vec!["A", "b", "c"]);
    }

    #[test]
    fn non_media_and_hidden_files_are_ignored() {
        let tmp = media_tree(&[
            ("doc.pdf", "p"),
            ("config.json", "{}"),
            ("._video1.mp4", "resource fork"),
            (".mp4", "no stem"),
            ("mp4", "no extension"),
        ]);
        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        assert!(result.document.entries.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn directories_with_media_names_are_ignored() {
        let tmp = media_tree(&[("fake.mp4/inner.mp4", "x")]);
        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        assert!(result.document.entries.is_empty());
    }

    #[test]
    fn name_keeps_inner_dots() {
        let tmp = media_tree(&[("show.s01e02.mkv", "x")]);
        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        assert_eq!(names(&result), vec!["show.s01e02"]);
    }

    #[test]
    fn configured_extensions_and_base_url_are_used() {
        let tmp = media_tree(&[("loop.webm", "w"), ("clip.mp4", "m")]);
        let config = Config {
            base_url: "https://cdn.example/".to_string(),
            media_extensions: BTreeSet::from([".webm".to_string()]),
        };
        let result = build(&DirectoryTarget::root(tmp.path()), &config);

        assert_eq!(names(&result), vec!["loop"]);
        assert!(result.document.entries[0].url.starts_with("https://cdn.example/loop.webm?md5="));
        assert_eq!(result.document.entries[0].mime_type, "video/webm");
    }

    #[test]
    fn all_entries_share_the_timestamp() {
        let tmp = media_tree(&[("a.mp4", "1"), ("b.mp4", "2"), ("c.mp4", "3")]);
        let now = Utc::now();
        let result = build_feed(
            &DirectoryTarget::root(tmp.path()),
            &Config::default(),
            now,
            EntryOrder::Filesystem,
        )
        .unwrap();

        assert_eq!(result.document.entries.len(), 3);
        assert!(result.document.entries.iter().all(|e| e.published_at == now));
    }

    #[test]
    fn guid_combines_name_and_fingerprint() {
        let tmp = media_tree(&[("a.mp4", "same"), ("b.mp4", "same")]);
        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        let guids: Vec<String> = result.document.entries.iter().map(|e| e.guid()).collect();
        let fp = fingerprint_of("same");
        assert_eq!(guids, vec![format!("a-{fp}"), format!("b-{fp}")]);
    }

    #[test]
    fn channel_metadata_is_constant() {
        let tmp = media_tree(&[("promo/ad1.mov", "Y")]);
        let result = build(
            &DirectoryTarget::subdirectory(tmp.path(), "promo"),
            &Config::default(),
        );

        assert_eq!(result.document.title, "MB Media");
        assert_eq!(result.document.description, "MB");
        assert_eq!(result.document.generator, "Server RSS Generator");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = media_tree(&[("good.mp4", "ok"), ("locked.mp4", "secret")]);
        let locked = tmp.path().join("locked.mp4");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let result = build(&DirectoryTarget::root(tmp.path()), &Config::default());

        // root ignores permission bits
        if std::fs::File::open(&locked).is_err() {
            assert_eq!(names(&result), vec!["good"]);
            assert_eq!(result.skipped.len(), 1);
            assert_eq!(result.skipped[0].path, locked);
        } else {
            assert_eq!(names(&result), vec!["good", "locked"]);
        }
    }

    #[test]
    fn missing_directory_is_error() {
        let tmp = media_tree(&[]);
        let target = DirectoryTarget::subdirectory(tmp.path(), "gone");
        let result = build_feed(&target, &Config::default(), Utc::now(), EntryOrder::Name);

        assert!(matches!(result, Err(FeedError::ReadDir(..))));
    }

    #[test]
    fn mime_types() {
        assert_eq!(mime_type_for(".mp4"), "video/mp4");
        assert_eq!(mime_type_for(".avi"), "video/x-msvideo");
        assert_eq!(mime_type_for(".mkv"), "video/x-matroska");
        assert_eq!(mime_type_for(".ts"), "video/mp4");
    }

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("a.MP4"), Some(("a", ".mp4".to_string())));
        assert_eq!(split_extension("a.b.mov"), Some(("a.b", ".mov".to_string())));
        assert_eq!(split_extension(".hidden"), None);
        assert_eq!(split_extension("plain"), None);
    }
}
