//! Cookers: per-asset build strategy objects.
//!
//! A [`Cooker`] pairs one asset with the type-specific backend that knows how
//! to transform it, the asset's persisted staleness cache, and the import
//! list accumulated during compilation. The [`CookerBackend`] trait is the
//! seam to the asset-type-specific transform logic (texture compression,
//! material baking, map compilation); this crate only provides the trivial
//! pass-through backend for raw assets.

#![warn(missing_docs)]

pub mod backend;
pub mod cooker;
pub mod layout;
pub mod raw;
pub mod registry;

pub use backend::{combine, CookContext, CookStatus, CookerBackend, ImportSink};
pub use cooker::{BuildEnv, Cooker};
pub use layout::{BuildLayout, BuildMode};
pub use raw::RawCopyCooker;
pub use registry::{CookerRegistry, CookerSet};
