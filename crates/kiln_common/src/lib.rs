//! Shared foundational types used across the Kiln asset pipeline.
//!
//! This crate provides core types including target platform masks, build
//! language masks, asset identity, cancellation tokens, and the result-code
//! taxonomy shared by every cook stage.

#![warn(missing_docs)]

pub mod asset;
pub mod cancel;
pub mod error;
pub mod language;
pub mod target;

pub use asset::{Asset, AssetId, AssetKind};
pub use cancel::CancelToken;
pub use error::{CookError, CookResult};
pub use language::{Language, LanguageMask};
pub use target::{TargetMask, TargetPlatform};
