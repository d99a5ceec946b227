//! The per-asset cooker object: one asset, its backend, and its build state.

use std::path::PathBuf;
use std::sync::Arc;

use kiln_cache::{CacheError, ImportList, StalenessCache};
use kiln_common::{Asset, AssetKind, CookError, CookResult, LanguageMask, TargetMask};

use crate::backend::{CookContext, CookStatus, CookerBackend, ImportSink};
use crate::layout::BuildLayout;

/// Build-wide parameters shared by every cooker, behind one `Arc`.
pub struct BuildEnv {
    /// The output layout for this build.
    pub layout: BuildLayout,
    /// The source asset tree root.
    pub source_root: PathBuf,
    /// The enabled localization languages.
    pub languages: LanguageMask,
    /// All targets requested for the whole build.
    pub all_flags: TargetMask,
    /// Whether this is a final cooked build. Import lists are only recorded
    /// and persisted while cooking; preview builds leave them untouched.
    pub cooking: bool,
}

/// One asset paired with its backend and persisted build state.
///
/// A cooker is owned by exactly one thread at a time: the driver hands it to
/// a pool worker inside a cook command and gets it back at the barrier. No
/// state here is shared.
pub struct Cooker {
    asset: Asset,
    backend: Box<dyn CookerBackend>,
    cache: StalenessCache,
    imports: ImportList,
    warnings: Vec<String>,
    imports_reset: bool,
    env: Arc<BuildEnv>,
}

impl Cooker {
    /// Creates a cooker for an asset, loading its staleness cache and import
    /// list from the build-mode globals tree. Both loads are fail-safe.
    pub fn new(asset: Asset, backend: Box<dyn CookerBackend>, env: Arc<BuildEnv>) -> Cooker {
        let cache = StalenessCache::load(&env.layout.globals_path(&asset.path));
        let imports = ImportList::load(&env.layout.imports_path(&asset.path));
        Cooker {
            asset,
            backend,
            cache,
            imports,
            warnings: Vec::new(),
            imports_reset: false,
            env,
        }
    }

    /// The asset this cooker builds.
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// The asset kind of the backend.
    pub fn kind(&self) -> AssetKind {
        self.backend.kind()
    }

    /// Whether the backend may run on a pool worker.
    pub fn parallel_safe(&self) -> bool {
        self.backend.parallel_safe()
    }

    /// The imports recorded for this asset (persisted plus any recorded in
    /// this build).
    pub fn imports(&self) -> &ImportList {
        &self.imports
    }

    /// The output layout, shared by every cooker in the build.
    pub fn layout(&self) -> &BuildLayout {
        &self.env.layout
    }

    /// Drains warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Reports the asset's build status for one pass without mutating any
    /// cached state.
    pub fn status(&mut self, flags: TargetMask) -> CookResult<CookStatus> {
        let version = self.backend.version();
        let mut ctx = CookContext {
            asset: &self.asset,
            flags,
            all_flags: self.env.all_flags,
            languages: self.env.languages,
            cache: &mut self.cache,
            imports: ImportSink::new(&mut self.imports, false),
            layout: &self.env.layout,
            source_root: &self.env.source_root,
            version,
            updating: false,
            warnings: &mut self.warnings,
        };
        self.backend.status(&mut ctx)
    }

    /// Builds the asset for one pass if its cached output is stale.
    ///
    /// On a rebuild the staleness records are refreshed as they are compared,
    /// the backend compiles, and only then is the state persisted. A failed
    /// compile leaves the on-disk cache untouched so the asset stays stale.
    pub fn cook(&mut self, flags: TargetMask) -> CookResult<CookStatus> {
        let status = self.status(flags)?;
        if status != CookStatus::NeedRebuild {
            return Ok(status);
        }

        if self.env.cooking && !self.imports_reset {
            // First compiling pass of this build: the import list is rebuilt
            // from scratch across all passes.
            self.imports.clear();
            self.imports_reset = true;
        }

        let version = self.backend.version();
        let mut ctx = CookContext {
            asset: &self.asset,
            flags,
            all_flags: self.env.all_flags,
            languages: self.env.languages,
            cache: &mut self.cache,
            imports: ImportSink::new(&mut self.imports, self.env.cooking),
            layout: &self.env.layout,
            source_root: &self.env.source_root,
            version,
            updating: true,
            warnings: &mut self.warnings,
        };
        // Refresh the records the status pass compared read-only.
        self.backend.status(&mut ctx)?;
        self.backend.compile(&mut ctx)?;

        self.save_state()?;
        Ok(CookStatus::NeedRebuild)
    }

    fn save_state(&self) -> CookResult<()> {
        self.cache
            .save(&self.env.layout.globals_path(&self.asset.path))
            .map_err(cache_to_cook)?;
        if self.env.cooking {
            self.imports
                .save(&self.env.layout.imports_path(&self.asset.path))
                .map_err(cache_to_cook)?;
        }
        Ok(())
    }
}

fn cache_to_cook(e: CacheError) -> CookError {
    CookError::Io(e.to_string())
}
