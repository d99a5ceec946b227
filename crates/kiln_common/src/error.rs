//! The result-code taxonomy shared by every cook stage.
//!
//! Workers and inline cooks never let a panic or error escape as anything
//! other than a [`CookError`]; the driver records the first failure and
//! short-circuits the rest of the build with it.

use serde::{Deserialize, Serialize};

/// The standard result type for cook operations.
pub type CookResult<T> = Result<T, CookError>;

/// A failure produced by any stage of the cook pipeline.
///
/// Each variant maps to a short stable code string (see [`code`](Self::code))
/// used in log output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum CookError {
    /// An asset or import path could not be resolved.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A source asset could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A source or intermediate file has an unsupported version.
    #[error("bad version: {0}")]
    BadVersion(String),

    /// Asset metadata is missing or inconsistent.
    #[error("metadata error: {0}")]
    Meta(String),

    /// A source asset has an unrecognized or malformed format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A file failed integrity validation.
    #[error("corrupt file: {0}")]
    Corrupt(String),

    /// An archive, cache, or output file could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// The type-specific compile step failed.
    #[error("compiler error: {0}")]
    Compiler(String),

    /// A script asset failed to compile or execute.
    #[error("script error: {0}")]
    Script(String),

    /// The build was cancelled by the caller.
    #[error("cook cancelled")]
    Cancelled,

    /// A failure with no more specific classification.
    #[error("error: {0}")]
    Generic(String),
}

impl CookError {
    /// The short stable code string for this error, used in log output.
    pub fn code(&self) -> &'static str {
        match self {
            CookError::FileNotFound(_) => "FileNotFound",
            CookError::Parse(_) => "ParseError",
            CookError::BadVersion(_) => "BadVersion",
            CookError::Meta(_) => "MetaError",
            CookError::InvalidFormat(_) => "InvalidFormat",
            CookError::Corrupt(_) => "CorruptFile",
            CookError::Io(_) => "IOError",
            CookError::Compiler(_) => "CompilerError",
            CookError::Script(_) => "ScriptError",
            CookError::Cancelled => "Cancelled",
            CookError::Generic(_) => "ErrorGeneric",
        }
    }
}

impl From<std::io::Error> for CookError {
    fn from(e: std::io::Error) -> Self {
        CookError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strings_are_stable() {
        assert_eq!(CookError::FileNotFound("x".into()).code(), "FileNotFound");
        assert_eq!(CookError::Compiler("x".into()).code(), "CompilerError");
        assert_eq!(CookError::Cancelled.code(), "Cancelled");
        assert_eq!(CookError::Generic("x".into()).code(), "ErrorGeneric");
    }

    #[test]
    fn display_includes_detail() {
        let err = CookError::FileNotFound("tex/a.png".into());
        assert_eq!(err.to_string(), "file not found: tex/a.png");
    }

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CookError = io.into();
        assert_eq!(err.code(), "IOError");
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(CookError::Cancelled.to_string(), "cook cancelled");
    }
}
