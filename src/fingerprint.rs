//! Content fingerprints for cache busting.
//!
//! Every feed URL carries `?md5=<fingerprint>`. Players treat the whole URL
//! as a cache key, so a fingerprint has to change exactly when the bytes of
//! the file change:
//!
//! - **Content-based, not mtime-based.** Copying a library onto a fresh drive
//!   resets modification times; that must not force every player to
//!   re-download everything.
//! - **Whole file.** Two edits of the same length still produce different
//!   fingerprints.
//! - **Streaming.** Video files routinely exceed available memory on the
//!   small boards this runs on, so files are hashed in [`CHUNK_SIZE`] pieces.
//!
//! MD5 is used because the query parameter name is part of the contract with
//! the playback clients. It is a change detector here, not a security boundary.

use md5::{Digest, Md5};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Lowercase hex MD5 digest of a file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint everything `reader` yields, [`CHUNK_SIZE`] bytes at a time.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<Fingerprint> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(Fingerprint(format!("{:x}", hasher.finalize())))
}

/// Fingerprint the file at `path`.
///
/// Errors (vanished file, permission denied, device pulled mid-read) are
/// returned to the caller, which decides whether to skip the file.
pub fn fingerprint_file(path: &Path) -> io::Result<Fingerprint> {
    let file = File::open(path)?;
    fingerprint_reader(file)
}
