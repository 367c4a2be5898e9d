//! Feed serialization.
//!
//! Renders a [`FeedDocument`] as Media RSS and persists it next to the media.
//!
//! ## Output Shape
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <rss xmlns:media="http://search.yahoo.com/mrss/" version="2.0">
//!     <channel>
//!         <title>MB Media</title>
//!         <link/>
//!         <description>MB</description>
//!         <generator>Server RSS Generator</generator>
//!         <item>
//!             <title>video1</title>
//!             <pubDate>2025-06-01T12:00:00.000000Z</pubDate>
//!             <link>http://localhost/video1.mp4?md5=…</link>
//!             <description>http://localhost/video1.mp4?md5=…</description>
//!             <medium>video</medium>
//!             <guid>video1-…</guid>
//!             <media:content url="http://localhost/video1.mp4?md5=…" type="video/mp4" medium="video"/>
//!         </item>
//!     </channel>
//! </rss>
//! ```
//!
//! `link`, `description` and `media:content/@url` all carry the same
//! fingerprinted URL and `guid` carries the fingerprint too, so a content
//! change invalidates every place a player might cache by.
//!
//! ## Persistence
//!
//! Feeds are written to a temp file in the destination directory and renamed
//! over the old feed. A player polling mid-run sees either the previous feed
//! or the new one, never a truncated file. A failed write removes the temp
//! file and leaves the previous feed untouched.

use crate::feed::{FeedDocument, MediaEntry};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Media RSS namespace bound to the `media:` prefix.
pub const MEDIA_RSS_NAMESPACE: &str = "http://search.yahoo.com/mrss/";

const INDENT: &str = "    ";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Feed path has no parent directory: {0}")]
    NoParent(PathBuf),
    #[error("Cannot write {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
}

/// Escape text or attribute content.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            // XML 1.0 forbids these even as character references.
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => out.push('\u{FFFD}'),
            _ => out.push(c),
        }
    }
    out
}

/// `pubDate` format: UTC, microsecond precision, `Z` suffix.
pub fn format_pub_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn element(out: &mut String, depth: usize, name: &str, text: &str) {
    let pad = INDENT.repeat(depth);
    if text.is_empty() {
        let _ = writeln!(out, "{pad}<{name}/>");
    } else {
        let _ = writeln!(out, "{pad}<{name}>{}</{name}>", escape_xml(text));
    }
}

fn render_item(out: &mut String, entry: &MediaEntry) {
    let pad = INDENT.repeat(3);
    let url = escape_xml(&entry.url);
    let _ = writeln!(out, "{}<item>", INDENT.repeat(2));
    element(out, 3, "title", &entry.name);
    element(out, 3, "pubDate", &format_pub_date(&entry.published_at));
    element(out, 3, "link", &entry.url);
    element(out, 3, "description", &entry.url);
    element(out, 3, "medium", "video");
    element(out, 3, "guid", &entry.guid());
    let _ = writeln!(
        out,
        r#"{pad}<media:content url="{url}" type="{}" medium="video"/>"#,
        escape_xml(entry.mime_type)
    );
    let _ = writeln!(out, "{}</item>", INDENT.repeat(2));
}

/// Render a feed document as a complete XML string.
pub fn render_feed(doc: &FeedDocument) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<rss xmlns:media="{MEDIA_RSS_NAMESPACE}" version="2.0">"#
    );
    let _ = writeln!(out, "{INDENT}<channel>");
    element(&mut out, 2, "title", &doc.title);
    element(&mut out, 2, "link", "");
    element(&mut out, 2, "description", &doc.description);
    element(&mut out, 2, "generator", &doc.generator);
    for entry in &doc.entries {
        render_item(&mut out, entry);
    }
    let _ = writeln!(out, "{INDENT}</channel>");
    out.push_str("</rss>\n");
    out
}

/// Write `contents` to `path` via a sibling temp file and an atomic rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let io_err = |e: io::Error| WriteError::Io(path.to_path_buf(), e);
    let dir = path
        .parent()
        .ok_or_else(|| WriteError::NoParent(path.to_path_buf()))?;

    // Dropping the temp file on any early return deletes it.
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Render `doc` and replace the feed at `path`.
pub fn write_feed(doc: &FeedDocument, path: &Path) -> Result<(), WriteError> {
    write_atomic(path, render_feed(doc).as_bytes())
}
