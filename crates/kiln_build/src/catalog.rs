//! The path-to-asset resolution seam.

use std::collections::HashMap;

use kiln_common::Asset;

/// Resolves asset paths to asset references.
///
/// The driver resolves every root and every recorded import through this
/// trait; the CLI backs it with a source-tree scan, tests with an in-memory
/// map.
pub trait AssetCatalog: Send + Sync {
    /// Resolves a canonical asset path, or `None` if unknown.
    fn resolve(&self, path: &str) -> Option<Asset>;
}

/// A catalog over an in-memory asset map.
#[derive(Default)]
pub struct MemoryCatalog {
    assets: HashMap<String, Asset>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> MemoryCatalog {
        MemoryCatalog::default()
    }

    /// Adds an asset, keyed by its path.
    pub fn insert(&mut self, asset: Asset) {
        self.assets.insert(asset.path.clone(), asset);
    }

    /// The number of known assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl FromIterator<Asset> for MemoryCatalog {
    fn from_iter<T: IntoIterator<Item = Asset>>(iter: T) -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        for asset in iter {
            catalog.insert(asset);
        }
        catalog
    }
}

impl AssetCatalog for MemoryCatalog {
    fn resolve(&self, path: &str) -> Option<Asset> {
        self.assets.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::AssetKind;

    #[test]
    fn resolves_known_paths() {
        let catalog: MemoryCatalog =
            [Asset::new("ui/main.mat", AssetKind::Material)].into_iter().collect();
        assert!(catalog.resolve("ui/main.mat").is_some());
        assert!(catalog.resolve("ui/other.mat").is_none());
    }
}
