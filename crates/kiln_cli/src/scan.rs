//! Source tree scanning: builds the asset catalog for a cook.

use std::io;
use std::path::Path;

use kiln_build::MemoryCatalog;
use kiln_common::{Asset, AssetKind};

/// Version-control directories skipped while scanning.
const SKIP_DIRS: [&str; 3] = [".svn", ".cvs", ".git"];

/// Walks the source tree and catalogs every file as an asset.
///
/// Asset paths are slash-separated and relative to `root`; the kind is
/// derived from the file extension, defaulting to [`AssetKind::Raw`].
pub fn scan_source_tree(root: &Path) -> io::Result<MemoryCatalog> {
    let mut catalog = MemoryCatalog::new();
    if root.is_dir() {
        scan_dir(root, "", &mut catalog)?;
    }
    Ok(catalog)
}

fn scan_dir(dir: &Path, prefix: &str, catalog: &mut MemoryCatalog) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let rel = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        let path = entry.path();
        if path.is_dir() {
            if SKIP_DIRS.iter().any(|s| name.eq_ignore_ascii_case(s)) {
                continue;
            }
            scan_dir(&path, &rel, catalog)?;
        } else {
            catalog.insert(Asset::new(&rel, kind_for_path(&rel)));
        }
    }
    Ok(())
}

/// Maps a file extension to the asset kind that cooks it.
fn kind_for_path(path: &str) -> AssetKind {
    let ext = match path.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return AssetKind::Raw,
    };
    match ext.as_str() {
        "png" | "tga" | "jpg" | "jpeg" | "dds" => AssetKind::Texture,
        "mat" => AssetKind::Material,
        "map" => AssetKind::Map,
        "mdl" | "mesh" => AssetKind::Model,
        "prt" => AssetKind::Particle,
        "wav" | "ogg" => AssetKind::Sound,
        _ => AssetKind::Raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_build::AssetCatalog;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn scan_catalogs_all_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ui/main.mat");
        write(dir.path(), "tex/a.png");
        write(dir.path(), "notes.txt");

        let catalog = scan_source_tree(dir.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.resolve("ui/main.mat").unwrap().kind,
            AssetKind::Material
        );
        assert_eq!(catalog.resolve("tex/a.png").unwrap().kind, AssetKind::Texture);
        assert_eq!(catalog.resolve("notes.txt").unwrap().kind, AssetKind::Raw);
    }

    #[test]
    fn scan_skips_version_control_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tex/a.png");
        write(dir.path(), ".git/objects/blob");
        write(dir.path(), "ui/.svn/entries");

        let catalog = scan_source_tree(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn scan_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = scan_source_tree(&dir.path().join("nope")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(kind_for_path("a/b.TGA"), AssetKind::Texture);
        assert_eq!(kind_for_path("a/b.map"), AssetKind::Map);
        assert_eq!(kind_for_path("a/b.mdl"), AssetKind::Model);
        assert_eq!(kind_for_path("a/b.prt"), AssetKind::Particle);
        assert_eq!(kind_for_path("a/b.ogg"), AssetKind::Sound);
        assert_eq!(kind_for_path("noext"), AssetKind::Raw);
    }
}
