//! Binary on-disk persistence for staleness caches.
//!
//! Each asset's cache is one file under the build-mode globals root, framed
//! with a small validated header: magic bytes, format version, and an XXH3-64
//! checksum of the payload. Loading is fail-safe — any validation failure
//! yields an empty cache, which forces a rebuild rather than an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::StalenessCache;
use crate::error::CacheError;
use crate::value::Value;

/// Magic bytes identifying a Kiln staleness cache file.
const CACHE_MAGIC: [u8; 4] = *b"KSTC";

/// Current cache file format version. Increment on breaking changes.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Header prepended to every cache file for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheHeader {
    magic: [u8; 4],
    format_version: u32,
    checksum: u64,
}

impl StalenessCache {
    /// Loads a cache file, or returns an empty cache.
    ///
    /// Missing file, bad magic, wrong format version, checksum mismatch, or
    /// undecodable payload all produce an empty cache. Never fatal.
    pub fn load(path: &Path) -> StalenessCache {
        StalenessCache::try_load(path).unwrap_or_default()
    }

    fn try_load(path: &Path) -> Option<StalenessCache> {
        let raw = std::fs::read(path).ok()?;
        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: CacheHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;

        if header.magic != CACHE_MAGIC || header.format_version != CACHE_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if xxhash_rust::xxh3::xxh3_64(payload) != header.checksum {
            return None;
        }

        let root: Value = bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .ok()?
            .0;
        Some(StalenessCache { root })
    }

    /// Saves the cache to a file, creating parent directories as needed.
    ///
    /// Called only after a successful cook; a failed cook must leave the old
    /// record in place so the staleness signal stays conservative.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let payload = bincode::serde::encode_to_vec(&self.root, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header = CacheHeader {
            magic: CACHE_MAGIC,
            format_version: CACHE_FORMAT_VERSION,
            checksum: xxhash_rust::xxh3::xxh3_64(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload.
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        std::fs::write(path, &output).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
