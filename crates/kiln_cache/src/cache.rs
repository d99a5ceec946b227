//! Staleness comparisons over the per-asset value tree.
//!
//! Every comparison answers one question: is the cached record older than the
//! live value? A record that is absent is always treated as older (forces a
//! rebuild). A record that is *newer* than the live value — clock skew, or a
//! source file reverted from backup — is deliberately treated as not
//! requiring a rebuild; callers log it as a warning instead. That asymmetry
//! is long-standing observed behavior, not a bug.

use kiln_common::TargetMask;

use crate::stamp::FileStamp;
use crate::value::Value;

/// Reserved key for the cooker implementation version.
pub const VERSION_KEY: &str = "__cookerVersion";

/// Reserved key for the asset source modification time.
pub const MODIFIED_TIME_KEY: &str = "__cookerModifiedTime";

/// Reserved key for the localization language-set fingerprint.
pub const LOCALIZED_VERSION_KEY: &str = "__cookerLocalizedVersion";

/// Cooker version sentinel meaning "always rebuild".
pub const ALWAYS_REBUILD: i64 = -1;

/// The result of comparing a cached record against a live value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staleness {
    /// The cached value is older than the live value, or missing: rebuild.
    Stale,
    /// The cached value matches the live value.
    Unchanged,
    /// The cached value is newer than the live value. Unusual; not treated
    /// as requiring a rebuild, but worth a warning in the log.
    Newer,
}

impl Staleness {
    /// Returns `true` if the comparison requires a rebuild.
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale)
    }
}

/// The per-asset staleness cache: a hierarchical key/value store namespaced
/// by target platform.
///
/// All keys passed to the comparison methods are logical keys; the target's
/// prefix (`"PC/"`, `"Generic/"`, ...) is applied internally so the same
/// logical key holds independent values per platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StalenessCache {
    pub(crate) root: Value,
}

impl StalenessCache {
    /// Creates a new, empty cache (everything stale).
    pub fn new() -> StalenessCache {
        StalenessCache::default()
    }

    /// Looks up the raw string value for a target-qualified key.
    pub fn get(&self, target: TargetMask, key: &str) -> Option<&str> {
        self.root.get(&format!("{}{key}", target.key_prefix()))
    }

    /// Sets the raw string value for a target-qualified key.
    pub fn set(&mut self, target: TargetMask, key: &str, value: impl Into<String>) {
        self.root.set(&format!("{}{key}", target.key_prefix()), value);
    }

    /// Returns `true` if the cache holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Compares the cached cooker version against the live one.
    ///
    /// A cached version lower than `live` means the cooker implementation has
    /// advanced and its output must be rebuilt. The [`ALWAYS_REBUILD`]
    /// sentinel as `live` forces Stale unconditionally.
    pub fn compare_version(
        &mut self,
        target: TargetMask,
        live: i64,
        update_if_newer: bool,
    ) -> Staleness {
        let cached = self
            .get(target, VERSION_KEY)
            .and_then(|s| s.parse::<i64>().ok());

        let result = match cached {
            None => Staleness::Stale,
            Some(_) if live == ALWAYS_REBUILD => Staleness::Stale,
            Some(v) if v < live => Staleness::Stale,
            Some(v) if v > live => Staleness::Newer,
            Some(_) => Staleness::Unchanged,
        };

        if result.is_stale() && update_if_newer {
            self.set(target, VERSION_KEY, live.to_string());
        }
        result
    }

    /// Compares the cached source modification time against the live one.
    pub fn compare_modified_time(
        &mut self,
        target: TargetMask,
        live: FileStamp,
        update_if_newer: bool,
    ) -> Staleness {
        self.compare_stamp_key(target, MODIFIED_TIME_KEY, Some(live), update_if_newer)
    }

    /// Compares the cached modification time of a referenced file against its
    /// live time, also tracking the referenced path itself.
    ///
    /// If the path recorded under `<key>_file` differs from `path`, the
    /// record is stale regardless of timestamps (the reference was retargeted
    /// to a different file). A `live` of `None` means the file is missing:
    /// always stale.
    pub fn compare_file_time(
        &mut self,
        target: TargetMask,
        key: &str,
        path: &str,
        live: Option<FileStamp>,
        update_if_newer: bool,
    ) -> Staleness {
        let file_key = format!("{key}_file");
        let path_changed = self
            .get(target, &file_key)
            .map(|recorded| recorded != path)
            .unwrap_or(false);

        if update_if_newer {
            self.set(target, &file_key, path);
        }

        let result = self.compare_stamp_key(target, key, live, update_if_newer);
        if path_changed {
            // The timestamp may agree but the reference points elsewhere now.
            if update_if_newer {
                if let Some(live) = live {
                    self.set(target, key, live.to_string());
                }
            }
            return Staleness::Stale;
        }
        result
    }

    /// Compares a cached string record (e.g. a localization fingerprint)
    /// against the live value.
    ///
    /// String records update on change: a missing or different record is
    /// rewritten with the live value and reported Stale.
    pub fn compare_string(&mut self, target: TargetMask, key: &str, live: &str) -> Staleness {
        match self.get(target, key) {
            Some(cached) if cached == live => Staleness::Unchanged,
            _ => {
                self.set(target, key, live);
                Staleness::Stale
            }
        }
    }

    /// Returns the stamp recorded under a target-qualified key, if any.
    pub fn stamp_for_key(&self, target: TargetMask, key: &str) -> Option<FileStamp> {
        self.get(target, key).and_then(FileStamp::parse)
    }

    /// Returns the recorded source modification time, if any.
    pub fn modified_time(&self, target: TargetMask) -> Option<FileStamp> {
        self.stamp_for_key(target, MODIFIED_TIME_KEY)
    }

    fn compare_stamp_key(
        &mut self,
        target: TargetMask,
        key: &str,
        live: Option<FileStamp>,
        update_if_newer: bool,
    ) -> Staleness {
        let live = match live {
            Some(s) => s,
            None => return Staleness::Stale,
        };
        let cached = self.stamp_for_key(target, key);

        let result = match cached {
            None => Staleness::Stale,
            Some(c) if c < live => Staleness::Stale,
            Some(c) if c > live => Staleness::Newer,
            Some(_) => Staleness::Unchanged,
        };

        if result.is_stale() && update_if_newer {
            self.set(target, key, live.to_string());
        }
        result
    }
}
