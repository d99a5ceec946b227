//! Packaging error types.

use std::path::PathBuf;

/// An error raised while writing or reading archive containers.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// A file or directory could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// zlib compression of an entry failed.
    #[error("compression failure for entry '{0}'")]
    Compression(String),

    /// A lump name exceeds the container's name limit.
    #[error("lump name too long: '{0}'")]
    NameTooLong(String),

    /// A write to the underlying archive stream failed.
    #[error("archive stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// An archive failed signature or structure validation.
    #[error("invalid archive: {0}")]
    Invalid(String),
}

impl PackError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> PackError {
        PackError::Io {
            path: path.into(),
            source,
        }
    }
}
