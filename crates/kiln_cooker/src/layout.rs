//! The on-disk layout of build output.
//!
//! All output lives under one root, split by build mode: `cooked/` for final
//! builds and `temp/` for intermediate (editor preview) builds, each with its
//! own staleness state so a preview never poisons a shipping build. Under the
//! mode root:
//!
//! ```text
//! out/generic/<pkg>/...   platform-independent cooked output
//! out/<platform>/<pkg>/...  per-platform cooked output
//! out/tags/<pkg>/...      per-asset tag blobs
//! out/globals/<pkg>/...   staleness caches and imports files
//! out/packages/           per-package lump files
//! out/shaders/            shader intermediates
//! paks/                   final archive containers
//! ```

use std::io;
use std::path::{Path, PathBuf};

use kiln_common::{TargetMask, TargetPlatform};

/// Which of the two output trees a build writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Final cooked output, packaged into archives.
    Cooked,
    /// Intermediate preview output used by editor tooling.
    Intermediate,
}

impl BuildMode {
    fn dir_name(&self) -> &'static str {
        match self {
            BuildMode::Cooked => "cooked",
            BuildMode::Intermediate => "temp",
        }
    }
}

/// Resolves build output paths under a root directory.
#[derive(Clone, Debug)]
pub struct BuildLayout {
    base: PathBuf,
    mode: BuildMode,
}

impl BuildLayout {
    /// Creates a layout rooted at `root` for the given mode.
    pub fn new(root: &Path, mode: BuildMode) -> BuildLayout {
        BuildLayout {
            base: root.join(mode.dir_name()),
            mode,
        }
    }

    /// The build mode this layout writes to.
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// The mode root (everything below lives under it).
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The output tree for the given target mask: a platform tree when the
    /// mask names a single platform, the generic tree otherwise.
    pub fn out_dir(&self, target: TargetMask) -> PathBuf {
        match single_platform(target) {
            Some(p) => self.base.join("out").join(p.dir_name()),
            None => self.base.join("out").join("generic"),
        }
    }

    /// The cooked-output path for an asset-relative file under a target tree.
    pub fn file_path(&self, rel: &str, target: TargetMask) -> PathBuf {
        self.out_dir(target).join(rel)
    }

    /// The tag-blob path for an asset under a target.
    ///
    /// Platform tags carry the platform's directory name as an extra
    /// extension: `ui/main.mat.pc.tag`.
    pub fn tag_path(&self, asset_path: &str, target: TargetMask) -> PathBuf {
        let name = match single_platform(target) {
            Some(p) => format!("{asset_path}.{}.tag", p.dir_name()),
            None => format!("{asset_path}.tag"),
        };
        self.base.join("out").join("tags").join(name)
    }

    /// The staleness cache path for an asset.
    pub fn globals_path(&self, asset_path: &str) -> PathBuf {
        self.base.join("out").join("globals").join(asset_path)
    }

    /// The imports file path for an asset.
    pub fn imports_path(&self, asset_path: &str) -> PathBuf {
        self.base
            .join("out")
            .join("globals")
            .join(format!("{asset_path}.imports"))
    }

    /// The per-package lump file directory.
    pub fn packages_dir(&self) -> PathBuf {
        self.base.join("out").join("packages")
    }

    /// The shader intermediate directory.
    pub fn shaders_dir(&self) -> PathBuf {
        self.base.join("out").join("shaders")
    }

    /// The final archive directory.
    pub fn paks_dir(&self) -> PathBuf {
        self.base.join("paks")
    }

    /// The archive path for the given name (e.g. `"pak0"`, `"pc"`).
    pub fn pak_path(&self, name: &str) -> PathBuf {
        self.paks_dir().join(format!("{name}.pak"))
    }

    /// Creates the output directory scaffolding for a build.
    ///
    /// With `clean` set, the entire mode root is removed first.
    pub fn make_build_dirs(&self, targets: TargetMask, clean: bool) -> io::Result<()> {
        if clean && self.base.exists() {
            std::fs::remove_dir_all(&self.base)?;
        }

        std::fs::create_dir_all(self.out_dir(TargetMask::GENERIC))?;
        for platform in targets.iter() {
            std::fs::create_dir_all(self.out_dir(TargetMask::only(platform)))?;
        }
        std::fs::create_dir_all(self.base.join("out").join("tags"))?;
        std::fs::create_dir_all(self.base.join("out").join("globals"))?;
        std::fs::create_dir_all(self.packages_dir())?;
        std::fs::create_dir_all(self.shaders_dir())?;
        std::fs::create_dir_all(self.paks_dir())?;
        Ok(())
    }
}

fn single_platform(target: TargetMask) -> Option<TargetPlatform> {
    let p = target.first_target()?;
    (target == TargetMask::only(p)).then_some(p)
}
