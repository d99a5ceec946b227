//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::ProjectConfig;

/// Loads and validates a `kiln.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join("kiln.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.cook.compression > 9 {
        return Err(ConfigError::Validation(format!(
            "cook.compression must be 0-9, got {}",
            config.cook.compression
        )));
    }
    // Resolve masks now so bad names fail at load time, not mid-cook.
    config.cook.target_mask()?;
    config.cook.language_mask()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "mygame"
version = "0.1.0"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "mygame");
        assert_eq!(config.project.source_dir, "assets");
        assert_eq!(config.project.output_dir, "cooked");
        assert!(config.cook.roots.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "mygame"
version = "0.2.0"
source_dir = "content"
output_dir = "build/cooked"

[cook]
roots = ["ui/main.mat", "world/e1m1.map"]
platforms = ["pc", "ios"]
languages = ["en", "fr"]
compression = 9
threads = 8
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.source_dir, "content");
        assert_eq!(config.cook.roots.len(), 2);
        assert_eq!(config.cook.compression, 9);
        assert_eq!(config.cook.threads, 8);
        assert_eq!(config.cook.language_mask().unwrap().fingerprint(), "EN;FR");
    }

    #[test]
    fn empty_name_rejected() {
        let toml = r#"
[project]
name = ""
version = "0.1.0"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn compression_out_of_range_rejected() {
        let toml = r#"
[project]
name = "mygame"
version = "0.1.0"

[cook]
compression = 12
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn unknown_platform_rejected_at_load() {
        let toml = r#"
[project]
name = "mygame"
version = "0.1.0"

[cook]
platforms = ["saturn"]
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn invalid_toml_rejected() {
        assert!(matches!(
            load_config_from_str("not toml {{{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("kiln.toml"),
            "[project]\nname = \"t\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.name, "t");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_config(dir.path()), Err(ConfigError::Io(_))));
    }
}
