//! Configuration types deserialized from `kiln.toml`.

use serde::Deserialize;

use kiln_common::{Language, LanguageMask, TargetMask, TargetPlatform};

use crate::error::ConfigError;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, version, directory layout).
    pub project: ProjectMeta,
    /// Cook settings (roots, platforms, languages, compression, threads).
    #[serde(default)]
    pub cook: CookConfig,
}

/// Core project metadata required in every `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    pub version: String,
    /// Directory containing source assets, relative to the project root.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    /// Directory receiving cooked output, relative to the project root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Settings for the `kiln cook` command.
#[derive(Debug, Deserialize)]
pub struct CookConfig {
    /// Root asset paths the dependency closure starts from.
    #[serde(default)]
    pub roots: Vec<String>,
    /// Platform names to cook for (e.g. `["pc", "ios"]`).
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    /// Language codes to cook localized content for.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Zlib compression level for archive entries, 0 (off) to 9.
    #[serde(default = "default_compression")]
    pub compression: u32,
    /// Worker thread count; 0 uses one worker per available core.
    #[serde(default)]
    pub threads: usize,
}

impl Default for CookConfig {
    fn default() -> Self {
        CookConfig {
            roots: Vec::new(),
            platforms: default_platforms(),
            languages: default_languages(),
            compression: default_compression(),
            threads: 0,
        }
    }
}

impl CookConfig {
    /// Resolves the configured platform names into a target mask.
    pub fn target_mask(&self) -> Result<TargetMask, ConfigError> {
        let mut mask = TargetMask::GENERIC;
        for name in &self.platforms {
            let platform = TargetPlatform::parse(name)
                .ok_or_else(|| ConfigError::UnknownPlatform(name.clone()))?;
            mask = mask.union(TargetMask::only(platform));
        }
        Ok(mask)
    }

    /// Resolves the configured language codes into a language mask.
    pub fn language_mask(&self) -> Result<LanguageMask, ConfigError> {
        let mut mask = LanguageMask::default();
        for code in &self.languages {
            let lang =
                Language::parse(code).ok_or_else(|| ConfigError::UnknownLanguage(code.clone()))?;
            mask = mask.with(lang);
        }
        Ok(mask)
    }
}

fn default_source_dir() -> String {
    "assets".to_string()
}

fn default_output_dir() -> String {
    "cooked".to_string()
}

fn default_platforms() -> Vec<String> {
    vec!["pc".to_string()]
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_compression() -> u32 {
    6
}
