//! The build driver: dependency closure, worker pool, and packaging.
//!
//! A [`BuildSession`] ties together the asset catalog, the cooker registry,
//! the output layout, and the build log, and drives the whole cook: one
//! generic pass and one pass per target platform, each walking the import
//! closure level by level with a barrier between levels, then packaging the
//! cooked output into archives.

#![warn(missing_docs)]

pub mod catalog;
pub mod driver;
pub mod log;
pub mod queue;
pub mod session;

pub use catalog::{AssetCatalog, MemoryCatalog};
pub use log::BuildLog;
pub use queue::{CookCommand, CookQueue};
pub use session::{BuildOptions, BuildSession};
