//! The staleness cache: per-asset persisted build state.
//!
//! Each asset carries a small key/value store recording the file times,
//! cooker versions, and localization fingerprints its output was built from.
//! Comparing those records against live values answers "does this asset need
//! rebuilding for this target" without opening the asset itself.
//!
//! All reads are fail-safe: a missing or corrupt cache file yields an empty
//! cache, which is equivalent to "everything is stale".

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod imports;
pub mod stamp;
pub mod store;
pub mod value;

pub use cache::{Staleness, StalenessCache};
pub use error::CacheError;
pub use imports::{Import, ImportList};
pub use stamp::FileStamp;
pub use value::Value;
