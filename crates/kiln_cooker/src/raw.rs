//! The pass-through backend for assets with no dedicated compiler.

use kiln_common::{AssetKind, CookError, CookResult};

use crate::backend::{combine, CookContext, CookStatus, CookerBackend};

/// Copies the source file to generic output unchanged.
///
/// Raw assets have no per-platform variants, so this backend only
/// participates in the generic pass. Staleness is the source file time plus
/// the backend version.
#[derive(Default)]
pub struct RawCopyCooker;

impl RawCopyCooker {
    /// Creates a raw-copy backend.
    pub fn new() -> RawCopyCooker {
        RawCopyCooker
    }
}

impl CookerBackend for RawCopyCooker {
    fn kind(&self) -> AssetKind {
        AssetKind::Raw
    }

    fn status(&mut self, ctx: &mut CookContext<'_>) -> CookResult<CookStatus> {
        if !ctx.flags.is_generic() {
            return Ok(CookStatus::Ignore);
        }
        let s = combine(ctx.compare_version(), ctx.compare_source_time());
        Ok(if s.is_stale() {
            CookStatus::NeedRebuild
        } else {
            CookStatus::UpToDate
        })
    }

    fn compile(&mut self, ctx: &mut CookContext<'_>) -> CookResult<()> {
        let src = ctx.source_path(&ctx.asset.path);
        if !src.exists() {
            return Err(CookError::FileNotFound(ctx.asset.path.clone()));
        }

        let out = ctx.output_path(&ctx.asset.path);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&src, &out)?;
        Ok(())
    }
}
