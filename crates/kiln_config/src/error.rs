//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `kiln.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configured platform name is not recognized.
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    /// A configured language code is not recognized.
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}
