//! Build session setup: options, collaborators, and lifetime.

use std::path::PathBuf;

use kiln_common::{CancelToken, LanguageMask, TargetMask, TargetPlatform};
use kiln_cooker::{BuildLayout, BuildMode, CookerRegistry};

use crate::catalog::AssetCatalog;
use crate::log::BuildLog;

/// Tunables for one build.
pub struct BuildOptions {
    /// The target platforms to cook and package for.
    pub targets: TargetMask,
    /// The localization languages to build.
    pub languages: LanguageMask,
    /// zlib level for archive entries, 0 disables compression.
    pub compression: u32,
    /// Worker thread count; 0 means one per available core.
    pub threads: usize,
    /// Remove the whole output tree before cooking.
    pub clean: bool,
    /// Skip cooking and package data; just rebuild the archives.
    pub scripts_only: bool,
    /// Cooked (final) or intermediate (preview) output.
    pub mode: BuildMode,
}

impl Default for BuildOptions {
    fn default() -> BuildOptions {
        BuildOptions {
            targets: TargetMask::only(TargetPlatform::Pc),
            languages: LanguageMask::EN_ONLY,
            compression: 6,
            threads: 0,
            clean: false,
            scripts_only: false,
            mode: BuildMode::Cooked,
        }
    }
}

/// One build invocation: the driver state plus its collaborators.
pub struct BuildSession<'a> {
    pub(crate) opts: BuildOptions,
    pub(crate) catalog: &'a dyn AssetCatalog,
    pub(crate) registry: &'a CookerRegistry,
    pub(crate) layout: BuildLayout,
    pub(crate) source_root: PathBuf,
    pub(crate) scripts_dir: Option<PathBuf>,
    pub(crate) log: BuildLog,
    pub(crate) cancel: CancelToken,
}

impl<'a> BuildSession<'a> {
    /// Creates a session cooking `source_root` into `output_root`.
    pub fn new(
        output_root: PathBuf,
        source_root: PathBuf,
        catalog: &'a dyn AssetCatalog,
        registry: &'a CookerRegistry,
        opts: BuildOptions,
        log: BuildLog,
    ) -> BuildSession<'a> {
        let layout = BuildLayout::new(&output_root, opts.mode);
        BuildSession {
            opts,
            catalog,
            registry,
            layout,
            source_root,
            scripts_dir: None,
            log,
            cancel: CancelToken::new(),
        }
    }

    /// Adds a scripts directory packed into `pak0` under `Scripts/`.
    pub fn set_scripts_dir(&mut self, dir: PathBuf) {
        self.scripts_dir = Some(dir);
    }

    /// A token that cancels this build when set; safe to hand to other
    /// threads (a GUI stop button, a signal handler).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The build log.
    pub fn log(&self) -> &BuildLog {
        &self.log
    }

    /// The output layout this session writes to.
    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    pub(crate) fn worker_count(&self) -> usize {
        if self.opts.threads > 0 {
            return self.opts.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;

    #[test]
    fn default_options() {
        let opts = BuildOptions::default();
        assert_eq!(opts.targets, TargetMask::only(TargetPlatform::Pc));
        assert_eq!(opts.languages, LanguageMask::EN_ONLY);
        assert_eq!(opts.compression, 6);
        assert!(!opts.clean);
    }

    #[test]
    fn explicit_thread_count_wins() {
        let catalog = MemoryCatalog::new();
        let registry = CookerRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let session = BuildSession::new(
            dir.path().join("out"),
            dir.path().join("src"),
            &catalog,
            &registry,
            BuildOptions {
                threads: 3,
                ..BuildOptions::default()
            },
            BuildLog::sink(),
        );
        assert_eq!(session.worker_count(), 3);
    }
}
