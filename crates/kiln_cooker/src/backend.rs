//! The seam between the pipeline and asset-type-specific transform logic.
//!
//! A [`CookerBackend`] implements the two type-specific operations — build
//! status and compile — against a [`CookContext`] that exposes the asset,
//! its staleness cache, the output layout, and import recording. Backends
//! never see the worker pool or the closure driver.

use std::path::{Path, PathBuf};

use kiln_cache::{
    cache::{LOCALIZED_VERSION_KEY, MODIFIED_TIME_KEY},
    FileStamp, ImportList, Staleness, StalenessCache,
};
use kiln_common::{Asset, AssetKind, CookResult, Language, LanguageMask, TargetMask};

use crate::layout::BuildLayout;

/// The build status of an asset for one target pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CookStatus {
    /// The asset does not participate in this pass at all.
    Ignore,
    /// Cached output is stale or missing; the asset must be compiled.
    NeedRebuild,
    /// Cached output is valid for this pass.
    UpToDate,
}

/// Records imports while an asset is actively cooking.
///
/// Import recording is a write-time side effect of compilation: outside a
/// cooking (final build) pass every call is a no-op. Intermediate preview
/// builds therefore never rewrite an asset's import list.
pub struct ImportSink<'a> {
    list: &'a mut ImportList,
    enabled: bool,
}

impl<'a> ImportSink<'a> {
    pub(crate) fn new(list: &'a mut ImportList, enabled: bool) -> ImportSink<'a> {
        ImportSink { list, enabled }
    }

    /// Records a dependency on another asset, merging platform masks when
    /// the path was already recorded. Returns the import's index.
    pub fn add(&mut self, path: &str, platforms: TargetMask) -> usize {
        if !self.enabled {
            return 0;
        }
        self.list.add(path, platforms.intersect(TargetMask::ALL))
    }
}

/// Everything a backend sees while reporting status or compiling one asset.
pub struct CookContext<'a> {
    /// The asset being cooked.
    pub asset: &'a Asset,
    /// The target flags of this pass (generic, or a single platform).
    pub flags: TargetMask,
    /// All targets requested for the whole build.
    pub all_flags: TargetMask,
    /// The enabled localization languages.
    pub languages: LanguageMask,
    /// The asset's staleness cache.
    pub cache: &'a mut StalenessCache,
    /// Import recording (active only while cooking).
    pub imports: ImportSink<'a>,
    /// The output layout.
    pub layout: &'a BuildLayout,
    /// The source asset tree root.
    pub source_root: &'a Path,
    /// The backend's version stamp, used by [`compare_version`](Self::compare_version).
    pub version: i64,
    /// Whether comparisons refresh stale records. False during read-only
    /// status queries, true during the refresh pass that precedes a compile.
    pub updating: bool,
    /// Warnings accumulated during the call; drained into the build log.
    pub warnings: &'a mut Vec<String>,
}

impl CookContext<'_> {
    /// The absolute path of a source-tree file.
    pub fn source_path(&self, rel: &str) -> PathBuf {
        self.source_root.join(rel)
    }

    /// The output path for an asset-relative file under this pass's target.
    pub fn output_path(&self, rel: &str) -> PathBuf {
        self.layout.file_path(rel, self.flags)
    }

    /// Compares the cached cooker version against the backend's version.
    pub fn compare_version(&mut self) -> Staleness {
        self.cache
            .compare_version(self.flags, self.version, self.updating)
    }

    /// Compares the asset's own source file time against the cached record.
    pub fn compare_source_time(&mut self) -> Staleness {
        let live = FileStamp::for_file(&self.source_path(&self.asset.path));
        let s = match live {
            Some(live) => self
                .cache
                .compare_modified_time(self.flags, live, self.updating),
            None => Staleness::Stale,
        };
        self.warn_if_newer(s, MODIFIED_TIME_KEY);
        s
    }

    /// Compares a referenced source file's time against the cached record
    /// under `key`.
    pub fn compare_file_time(&mut self, key: &str, rel: &str) -> Staleness {
        let live = FileStamp::for_file(&self.source_path(rel));
        let s = self
            .cache
            .compare_file_time(self.flags, key, rel, live, self.updating);
        self.warn_if_newer(s, key);
        s
    }

    /// Compares an arbitrary string fingerprint (a shader profile, a
    /// compiler flag set) against the cached record under `key`.
    pub fn compare_cached_string(&mut self, key: &str, live: &str) -> Staleness {
        if self.updating {
            return self.cache.compare_string(self.flags, key, live);
        }
        match self.cache.get(self.flags, key) {
            Some(cached) if cached == live => Staleness::Unchanged,
            _ => Staleness::Stale,
        }
    }

    /// Compares a localized file reference: one record per enabled language
    /// plus the language-set fingerprint.
    ///
    /// Non-English variants live next to the base file with a `_<LANG>`
    /// suffix (`ui/strings.txt` → `ui/strings_FR.txt`). All per-language
    /// times are compared (and cached) even after the first stale hit, so
    /// one pass refreshes every record.
    pub fn compare_localized_file_time(&mut self, key: &str, rel: &str) -> Staleness {
        let mut result = Staleness::Unchanged;
        let languages = self.languages;
        for lang in languages.iter() {
            let (lang_key, lang_rel) = if lang == Language::En {
                (key.to_string(), rel.to_string())
            } else {
                (
                    format!("{key}_cookerLang_{}", lang.code()),
                    localized_variant(rel, lang),
                )
            };
            let s = self.compare_file_time(&lang_key, &lang_rel);
            result = combine(result, s);
        }

        let fingerprint = self.languages.fingerprint();
        let s = if self.updating {
            self.cache
                .compare_string(self.flags, LOCALIZED_VERSION_KEY, &fingerprint)
        } else {
            // Read-only comparison: a status query must not rewrite the
            // fingerprint record.
            match self.cache.get(self.flags, LOCALIZED_VERSION_KEY) {
                Some(cached) if cached == fingerprint => Staleness::Unchanged,
                _ => Staleness::Stale,
            }
        };
        combine(result, s)
    }

    fn warn_if_newer(&mut self, s: Staleness, key: &str) {
        if s == Staleness::Newer {
            self.warnings.push(format!(
                "{}: cached record for '{key}' is newer than the source (clock skew or reverted file); not rebuilding",
                self.asset.path
            ));
        }
    }
}

/// Combines two comparison results: Stale dominates, then Newer.
pub fn combine(a: Staleness, b: Staleness) -> Staleness {
    match (a, b) {
        (Staleness::Stale, _) | (_, Staleness::Stale) => Staleness::Stale,
        (Staleness::Newer, _) | (_, Staleness::Newer) => Staleness::Newer,
        _ => Staleness::Unchanged,
    }
}

/// Derives the localized variant path for a language: the extension is kept
/// and `_<LANG>` is appended to the stem.
fn localized_variant(rel: &str, lang: Language) -> String {
    match rel.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{}.{ext}", lang.code()),
        None => format!("{rel}_{}", lang.code()),
    }
}

/// A per-asset-type build strategy.
///
/// Implementations live outside this crate (texture, material, and map
/// compilers); [`RawCopyCooker`](crate::RawCopyCooker) is the built-in
/// pass-through for assets with no dedicated transform.
pub trait CookerBackend: Send {
    /// The asset kind this backend builds.
    fn kind(&self) -> AssetKind;

    /// The backend implementation version. Bumping it rebuilds all output;
    /// [`ALWAYS_REBUILD`](kiln_cache::cache::ALWAYS_REBUILD) disables
    /// caching entirely.
    fn version(&self) -> i64 {
        1
    }

    /// Whether this backend may run on a pool worker. Backends that share
    /// non-reentrant state (the map compiler's rendering context) return
    /// `false` and are serialized on the driver thread.
    fn parallel_safe(&self) -> bool {
        true
    }

    /// Reports the asset's build status for one pass without compiling.
    fn status(&mut self, ctx: &mut CookContext<'_>) -> CookResult<CookStatus>;

    /// Transforms the asset, writing target-specific output files and
    /// recording imports through the context.
    fn compile(&mut self, ctx: &mut CookContext<'_>) -> CookResult<()>;
}
