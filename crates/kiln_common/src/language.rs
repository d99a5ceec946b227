//! Build languages and localization fingerprints.
//!
//! Localized assets produce one output variant per enabled language. The
//! enabled set is carried through the build as a [`LanguageMask`], and its
//! canonical fingerprint string is stored in the staleness cache so that
//! adding or removing a language forces a rebuild of localized assets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A localization language the pipeline can cook content for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English (the default source language).
    En,
    /// French.
    Fr,
    /// Italian.
    It,
    /// German.
    De,
    /// Spanish.
    Es,
}

impl Language {
    /// All languages, in canonical (bit) order. English is always first.
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Fr,
        Language::It,
        Language::De,
        Language::Es,
    ];

    /// The uppercase code used in fingerprints and localized file suffixes.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Fr => "FR",
            Language::It => "IT",
            Language::De => "DE",
            Language::Es => "ES",
        }
    }

    /// The bit this language occupies in a [`LanguageMask`].
    pub fn bit(&self) -> u32 {
        match self {
            Language::En => 1 << 0,
            Language::Fr => 1 << 1,
            Language::It => 1 << 2,
            Language::De => 1 << 3,
            Language::Es => 1 << 4,
        }
    }

    /// Parses a language from its code (case-insensitive).
    pub fn parse(s: &str) -> Option<Language> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "fr" => Some(Language::Fr),
            "it" => Some(Language::It),
            "de" => Some(Language::De),
            "es" => Some(Language::Es),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A set of enabled build languages, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageMask(pub u32);

impl LanguageMask {
    /// The mask containing only English.
    pub const EN_ONLY: LanguageMask = LanguageMask(1);

    /// Creates a mask containing a single language.
    pub fn only(lang: Language) -> LanguageMask {
        LanguageMask(lang.bit())
    }

    /// Returns `true` if no languages are enabled.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the mask contains the given language.
    pub fn contains(&self, lang: Language) -> bool {
        self.0 & lang.bit() != 0
    }

    /// Adds a language to the mask.
    pub fn with(&self, lang: Language) -> LanguageMask {
        LanguageMask(self.0 | lang.bit())
    }

    /// Iterates over the languages in the mask, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Language> + '_ {
        Language::ALL.into_iter().filter(move |l| self.contains(*l))
    }

    /// The canonical fingerprint for the enabled language set
    /// (e.g. `"EN;FR;DE"`).
    ///
    /// Stored in the staleness cache under localized assets: when the
    /// fingerprint changes, the asset is stale.
    pub fn fingerprint(&self) -> String {
        let codes: Vec<&str> = self.iter().map(|l| l.code()).collect();
        codes.join(";")
    }
}

impl fmt::Debug for LanguageMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageMask({})", self.fingerprint())
    }
}
