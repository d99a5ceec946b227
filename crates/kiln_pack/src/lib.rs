//! The archive packager: lump containers, directory packing, package data.
//!
//! Cooked output ships in lump archives: a small signed header, streamed
//! entry payloads, and a name-sorted directory written at the end of the
//! file. [`pak`] fills archives from directory trees with per-entry zlib
//! compression; [`package`] writes the per-package asset directory (tag
//! blobs and the import table) consumed by the runtime loader.

#![warn(missing_docs)]

pub mod error;
pub mod lump;
pub mod pak;
pub mod package;
pub mod tags;

pub use error::PackError;
pub use lump::{LumpReader, LumpWriter, LUMP_MAGIC, LUMP_SIG, PAK_MAGIC, PAK_SIG};
pub use pak::{pack_directory, write_archive};
pub use package::{decode_imports, write_package, PackageEntry};
pub use tags::{tag_slot, AssetTag, TAG_SLOTS};
