//! Per-package lump files: the asset directory the runtime loader mounts.
//!
//! Each package gets one lump file holding a zero-length lump per asset
//! (the asset's directory entry, with its [`AssetTag`] blob as the tag) and
//! an `@imports` lump whose tag is the package-wide import path table that
//! asset tags index into.

use std::path::Path;

use crate::error::PackError;
use crate::lump::{LumpWriter, LUMP_MAGIC, LUMP_SIG};
use crate::tags::{AssetTag, TAG_SLOTS};

/// One asset's contribution to its package file.
pub struct PackageEntry {
    /// The asset name within the package (the lump name).
    pub name: String,
    /// The asset kind code.
    pub kind: u16,
    /// Per-target tag data, slot layout as in [`AssetTag`].
    pub target_tags: [Option<Vec<u8>>; TAG_SLOTS],
    /// The asset paths this asset imports.
    pub imports: Vec<String>,
}

/// Writes a package lump file from its entries. Returns the lump count
/// (entries plus the `@imports` table).
pub fn write_package(path: &Path, entries: &[PackageEntry]) -> Result<u32, PackError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| PackError::io(path, e))?;
    let mut writer = LumpWriter::begin(LUMP_SIG, LUMP_MAGIC, std::io::BufWriter::new(file))?;

    let mut table = ImportTable::default();

    for entry in entries {
        let mut tag = AssetTag::new(entry.kind);
        tag.target_tags = entry.target_tags.clone();
        tag.import_indices = entry.imports.iter().map(|p| table.add(p)).collect();

        let i = writer.write_lump(&entry.name, &[], 4)?;
        writer.set_tag(i, tag.encode());
    }

    let i = writer.write_lump("@imports", &[], 4)?;
    writer.set_tag(i, table.encode());

    let (_, count) = writer.finish()?;
    Ok(count)
}

/// Decodes an `@imports` tag back into the path table.
pub fn decode_imports(tag: &[u8]) -> Result<Vec<String>, PackError> {
    let bad = |what: &str| PackError::Invalid(format!("@imports: {what}"));
    if tag.len() < 2 {
        return Err(bad("too short"));
    }
    let count = u16::from_le_bytes([tag[0], tag[1]]) as usize;
    let mut cursor = 2;
    let mut paths = Vec::with_capacity(count);

    for _ in 0..count {
        if cursor + 2 > tag.len() {
            return Err(bad("truncated length"));
        }
        // Length includes the trailing NUL.
        let len = u16::from_le_bytes([tag[cursor], tag[cursor + 1]]) as usize;
        cursor += 2;
        if len == 0 || cursor + len > tag.len() {
            return Err(bad("truncated path"));
        }
        let path = std::str::from_utf8(&tag[cursor..cursor + len - 1])
            .map_err(|_| bad("non-UTF-8 path"))?;
        paths.push(path.to_string());
        cursor += len;
    }
    Ok(paths)
}

/// The package-wide import path table, de-duplicated in insertion order.
#[derive(Default)]
struct ImportTable {
    paths: Vec<String>,
}

impl ImportTable {
    fn add(&mut self, path: &str) -> u16 {
        if let Some(i) = self.paths.iter().position(|p| p == path) {
            return i as u16;
        }
        self.paths.push(path.to_string());
        (self.paths.len() - 1) as u16
    }

    /// `count: u16`, then per path `len: u16` (NUL included) + bytes + NUL.
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.paths.len() as u16).to_le_bytes());
        for path in &self.paths {
            out.extend_from_slice(&((path.len() + 1) as u16).to_le_bytes());
            out.extend_from_slice(path.as_bytes());
            out.push(0);
        }
        out
    }
}
