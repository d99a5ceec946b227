//! File modification stamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A file modification time, in milliseconds since the Unix epoch.
///
/// Stamps are totally ordered and serialize as a decimal string inside cache
/// values, so records survive format evolution and remain greppable on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileStamp(pub u64);

impl FileStamp {
    /// Reads the modification stamp of a file.
    ///
    /// Returns `None` if the file does not exist or its metadata cannot be
    /// read; callers treat that as "always stale".
    pub fn for_file(path: &Path) -> Option<FileStamp> {
        let meta = std::fs::metadata(path).ok()?;
        let modified = meta.modified().ok()?;
        Some(FileStamp::from_system_time(modified))
    }

    /// Converts a [`SystemTime`] into a stamp.
    ///
    /// Times before the epoch clamp to zero.
    pub fn from_system_time(t: SystemTime) -> FileStamp {
        let millis = t
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        FileStamp(millis)
    }

    /// Parses a stamp from its cache-value string form.
    pub fn parse(s: &str) -> Option<FileStamp> {
        s.parse().ok().map(FileStamp)
    }
}

impl fmt::Display for FileStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
