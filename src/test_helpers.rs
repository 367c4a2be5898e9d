//! Shared test utilities.
//!
//! Builds throwaway media trees in a temp directory and pulls fields out of
//! rendered feeds, so module tests can assert on content without a full XML
//! parser.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = media_tree(&[("video1.mp4", "X"), ("promo/ad1.mov", "Y")]);
//! let report = run(tmp.path(), &RunOptions::default()).unwrap();
//!
//! let xml = read_feed(tmp.path(), "promo.xml");
//! assert_eq!(item_titles(&xml), vec!["ad1"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::fingerprint::{Fingerprint, fingerprint_reader};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory containing `files`, given as
/// `(relative path, contents)` pairs. Parent directories are created.
pub fn media_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }
    tmp
}

/// The fingerprint a file with `contents` would get.
pub fn fingerprint_of(contents: &str) -> Fingerprint {
    fingerprint_reader(contents.as_bytes()).unwrap()
}

// =========================================================================
// Feed inspection
// =========================================================================

/// Read a generated feed from the scan root. Panics if it's missing.
pub fn read_feed(root: &Path, feed_name: &str) -> String {
    std::fs::read_to_string(root.join(feed_name))
        .unwrap_or_else(|e| panic!("feed '{feed_name}' not readable: {e}"))
}

/// Text of every `<tag>...</tag>` occurrence, in document order.
pub fn tag_texts(xml: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let end = after
            .find(&close)
            .unwrap_or_else(|| panic!("unclosed <{tag}> in feed"));
        out.push(after[..end].to_string());
        rest = &after[end + close.len()..];
    }
    out
}

/// Titles of all `<item>`s (the channel title is skipped).
pub fn item_titles(xml: &str) -> Vec<String> {
    tag_texts(xml, "title").into_iter().skip(1).collect()
}

/// Links of all `<item>`s.
pub fn item_links(xml: &str) -> Vec<String> {
    tag_texts(xml, "link")
}

/// Number of `<item>` elements.
pub fn item_count(xml: &str) -> usize {
    xml.matches("<item>").count()
}
