//! The per-asset imports file: which other assets a cook referenced.
//!
//! Imports are recorded while an asset compiles and persisted next to its
//! staleness cache. The on-disk format is a small tagged binary record:
//! `tag: u32` (`"IMPT"`), `count: u32`, then `count` entries of
//! `{ platforms: i32, path_len: u32, path bytes }`, all little-endian.
//! A tag mismatch or short read loads as "no imports" rather than an error.

use std::path::Path;

use kiln_common::TargetMask;

use crate::error::CacheError;

/// Tag identifying an imports file.
const IMPORTS_TAG: u32 = u32::from_le_bytes(*b"IMPT");

/// A dependency edge: a referenced asset path and the platforms under which
/// the reference applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    /// The referenced asset path (e.g. `"tex/a.png"`).
    pub path: String,
    /// The platform mask under which this import is required.
    pub platforms: TargetMask,
}

/// An ordered list of imports, de-duplicated by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportList {
    imports: Vec<Import>,
}

impl ImportList {
    /// Creates an empty import list.
    pub fn new() -> ImportList {
        ImportList::default()
    }

    /// Records an import, merging platform masks when the path is already
    /// present. Returns the import's index.
    pub fn add(&mut self, path: &str, platforms: TargetMask) -> usize {
        if let Some(i) = self.imports.iter().position(|imp| imp.path == path) {
            self.imports[i].platforms = self.imports[i].platforms.union(platforms);
            return i;
        }
        self.imports.push(Import {
            path: path.to_string(),
            platforms,
        });
        self.imports.len() - 1
    }

    /// The recorded imports, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Import> {
        self.imports.iter()
    }

    /// The number of recorded imports.
    pub fn len(&self) -> usize {
        self.imports.len()
    }

    /// Returns `true` if no imports are recorded.
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Drops all recorded imports.
    pub fn clear(&mut self) {
        self.imports.clear();
    }

    /// Loads an imports file, or returns an empty list.
    ///
    /// Missing file, wrong tag, or any short read yields an empty list.
    pub fn load(path: &Path) -> ImportList {
        ImportList::try_load(path).unwrap_or_default()
    }

    fn try_load(path: &Path) -> Option<ImportList> {
        let raw = std::fs::read(path).ok()?;
        let mut cursor = 0usize;

        let tag = read_u32(&raw, &mut cursor)?;
        if tag != IMPORTS_TAG {
            return None;
        }
        let count = read_u32(&raw, &mut cursor)?;

        let mut list = ImportList::new();
        for _ in 0..count {
            let platforms = read_u32(&raw, &mut cursor)? as i32;
            let len = read_u32(&raw, &mut cursor)? as usize;
            let bytes = raw.get(cursor..cursor + len)?;
            cursor += len;

            let path = String::from_utf8(bytes.to_vec()).ok()?;
            list.add(&path, TargetMask(platforms as u8));
        }
        Some(list)
    }

    /// Saves the imports file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut out = Vec::new();
        out.extend_from_slice(&IMPORTS_TAG.to_le_bytes());
        out.extend_from_slice(&(self.imports.len() as u32).to_le_bytes());
        for imp in &self.imports {
            out.extend_from_slice(&(imp.platforms.0 as i32).to_le_bytes());
            out.extend_from_slice(&(imp.path.len() as u32).to_le_bytes());
            out.extend_from_slice(imp.path.as_bytes());
        }

        std::fs::write(path, &out).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn read_u32(raw: &[u8], cursor: &mut usize) -> Option<u32> {
    let bytes = raw.get(*cursor..*cursor + 4)?;
    *cursor += 4;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::TargetPlatform;

    #[test]
    fn add_dedupes_by_path() {
        let mut list = ImportList::new();
        let i0 = list.add("tex/a.png", TargetMask::only(TargetPlatform::Pc));
        let i1 = list.add("tex/b.png", TargetMask::GENERIC);
        let i2 = list.add("tex/a.png", TargetMask::only(TargetPlatform::Ios));
        assert_eq!((i0, i1, i2), (0, 1, 0));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn add_merges_platform_masks() {
        let mut list = ImportList::new();
        list.add("tex/a.png", TargetMask::only(TargetPlatform::Pc));
        list.add("tex/a.png", TargetMask::only(TargetPlatform::Ios));
        let imp = list.iter().next().unwrap();
        assert!(imp.platforms.contains(TargetPlatform::Pc));
        assert!(imp.platforms.contains(TargetPlatform::Ios));
    }

    #[test]
    fn preserves_insertion_order() {
        let mut list = ImportList::new();
        list.add("z.png", TargetMask::GENERIC);
        list.add("a.png", TargetMask::GENERIC);
        let paths: Vec<&str> = list.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["z.png", "a.png"]);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.mat.imports");

        let mut list = ImportList::new();
        list.add("tex/a.png", TargetMask::only(TargetPlatform::Pc));
        list.add("tex/b.png", TargetMask::GENERIC);
        list.save(&path).unwrap();

        let loaded = ImportList::load(&path);
        assert_eq!(loaded, list);
    }

    #[test]
    fn load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImportList::load(&dir.path().join("nope.imports")).is_empty());
    }

    #[test]
    fn load_wrong_tag_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.imports");
        let mut raw = Vec::new();
        raw.extend_from_slice(b"XXXX");
        raw.extend_from_slice(&1u32.to_le_bytes());
        std::fs::write(&path, &raw).unwrap();
        assert!(ImportList::load(&path).is_empty());
    }

    #[test]
    fn load_short_read_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.imports");
        // Valid tag, claims one entry, then truncates.
        let mut raw = Vec::new();
        raw.extend_from_slice(&IMPORTS_TAG.to_le_bytes());
        raw.extend_from_slice(&1u32.to_le_bytes());
        raw.extend_from_slice(&0i32.to_le_bytes());
        raw.extend_from_slice(&100u32.to_le_bytes());
        raw.extend_from_slice(b"tex/a");
        std::fs::write(&path, &raw).unwrap();
        assert!(ImportList::load(&path).is_empty());
    }

    #[test]
    fn save_empty_list_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.imports");
        ImportList::new().save(&path).unwrap();
        assert!(ImportList::load(&path).is_empty());
    }
}
