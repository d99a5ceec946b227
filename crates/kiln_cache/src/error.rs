//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while persisting cache state.
///
/// Reads are fail-safe and never produce these errors (corruption is a cache
/// miss); only writes report failures, because a cook that cannot persist its
/// staleness record must not claim success.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while writing a cache file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization error occurred.
    #[error("cache serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
