//! CLI output formatting.
//!
//! The run summary is for the person (or hook log) watching a drive get
//! processed. Diagnostics go through `tracing` on stderr; this is the
//! stdout report.
//!
//! # Output Format
//!
//! ```text
//! Config
//!     config.json (http://pi.local/; .mkv .mov .mp4)
//!
//! Feeds
//! 001 mrss.xml (2 items)
//! 002 promo.xml (1 item)
//!     Skipped: promo/broken.mp4 (Permission denied (os error 13))
//!
//! Failed
//! 001 archive/
//!     Cannot list /media/usb0/archive: Permission denied (os error 13)
//!
//! Wrote 2 feeds, 3 items, 1 skipped file, 1 failed directory
//! ```
//!
//! Each `format_*` function returns `Vec<String>` for testability and the
//! `print_*` wrapper writes to stdout. Format functions are pure.

use crate::config::{CONFIG_FILE_NAME, ConfigSource};
use crate::pipeline::RunReport;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 item`, `2 items`.
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Show `path` relative to the scan root when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

pub fn format_config_section(report: &RunReport) -> Vec<String> {
    let exts: Vec<&str> = report
        .config
        .media_extensions
        .iter()
        .map(String::as_str)
        .collect();
    let summary = format!("{}; {}", report.config.base_url, exts.join(" "));

    let line = match &report.config_source {
        ConfigSource::Defaults => format!("defaults ({summary})"),
        ConfigSource::UserFile => format!("{CONFIG_FILE_NAME} ({summary})"),
        ConfigSource::Fallback { reason } => {
            format!("defaults ({summary}), {CONFIG_FILE_NAME} ignored: {reason}")
        }
    };
    vec!["Config".to_string(), format!("{}{}", indent(1), line)]
}

pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = format_config_section(report);

    lines.push(String::new());
    lines.push("Feeds".to_string());
    for (i, feed) in report.feeds.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            feed.target.feed_name,
            plural(feed.entry_count, "item")
        ));
        for skipped in &feed.skipped {
            lines.push(format!(
                "{}Skipped: {} ({})",
                indent(1),
                display_path(&skipped.path, &report.root),
                skipped.error
            ));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for (i, failure) in report.failures.iter().enumerate() {
            let dir = if failure.target.is_root() {
                "./".to_string()
            } else {
                failure.target.url_prefix.clone()
            };
            lines.push(format!("{} {}", format_index(i + 1), dir));
            lines.push(format!("{}{}", indent(1), failure.error));
        }
    }

    let items: usize = report.feeds.iter().map(|f| f.entry_count).sum();
    let skipped = report.skipped_files().count();
    let verb = if report.dry_run { "Would write" } else { "Wrote" };
    let mut summary = format!(
        "{verb} {}, {}",
        plural(report.feeds.len(), "feed"),
        plural(items, "item")
    );
    if skipped > 0 {
        summary.push_str(&format!(", {}", plural(skipped, "skipped file")));
    }
    if !report.failures.is_empty() {
        let n = report.failures.len();
        if n == 1 {
            summary.push_str(", 1 failed directory");
        } else {
            summary.push_str(&format!(", {n} failed directories"));
        }
    }
    lines.push(String::new());
    lines.push(summary);
    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}
