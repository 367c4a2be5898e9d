//! # mrss-gen
//!
//! Generates Media RSS feeds for the videos on a removable drive. A mount
//! hook points it at the drive; it writes XML feeds that a web server then
//! serves to signage players.
//!
//! # Layout
//!
//! ```text
//! /media/usb0/                  scan root
//! ├── config.json               optional BASE_URL / MEDIA_EXTENSIONS
//! ├── video1.mp4                → listed in mrss.xml
//! ├── mrss.xml                  (generated)
//! ├── promo.xml                 (generated)
//! └── promo/
//!     ├── ad1.mov               → listed in promo.xml
//!     └── old/ad0.mov           (too deep, not listed)
//! ```
//!
//! Every feed item links to `<BASE_URL><path>?md5=<content hash>`. Players
//! cache by URL, so replacing a clip's content changes its URL and forces a
//! re-download, while an untouched clip keeps its URL across runs and across
//! drives.
//!
//! # Pipeline
//!
//! ```text
//! 1. Config     config.json + defaults  →  Config
//! 2. Partition  scan root               →  [DirectoryTarget]
//! 3. Build      each target             →  FeedDocument   (hashes every file)
//! 4. Write      each document           →  <name>.xml     (temp file + rename)
//! ```
//!
//! Every run regenerates every feed. A problem with one file or directory is
//! logged, reported, and skipped; only an unusable scan root fails the run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.json` loading, normalization, fallback to defaults |
//! | [`fingerprint`] | Streaming MD5 content fingerprints |
//! | [`partition`] | Which directories get a feed, and what it's called |
//! | [`feed`] | Media file selection and in-memory feed documents |
//! | [`writer`] | MRSS rendering and atomic feed persistence |
//! | [`pipeline`] | Runs all of the above and collects a [`pipeline::RunReport`] |
//! | [`output`] | Human-readable run summary |

pub mod config;
pub mod feed;
pub mod fingerprint;
pub mod output;
pub mod partition;
pub mod pipeline;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
