//! Asset identity: ids, kinds, and references.
//!
//! An asset is a named unit of source content living inside a package. Its
//! [`AssetId`] is derived from the asset path with XXH3-64, so the same path
//! always maps to the same id across runs and processes. Equality and the
//! cook-pass visited set are keyed on ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable identifier for an asset, derived from its path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Derives the id for an asset path using XXH3-64.
    pub fn from_path(path: &str) -> AssetId {
        AssetId(xxhash_rust::xxh3::xxh3_64(path.as_bytes()))
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({:016x})", self.0)
    }
}

/// The type of an asset, which selects the cooker backend used to build it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// A texture (image) asset.
    Texture,
    /// A material referencing textures and shader parameters.
    Material,
    /// A compiled world/map asset.
    Map,
    /// A static or skinned model.
    Model,
    /// A particle system definition.
    Particle,
    /// A sound or music asset.
    Sound,
    /// An asset with no dedicated cooker; copied through unchanged.
    Raw,
}

impl AssetKind {
    /// The stable numeric code stored in package tag blobs.
    pub fn code(&self) -> u16 {
        match self {
            AssetKind::Texture => 0,
            AssetKind::Material => 1,
            AssetKind::Map => 2,
            AssetKind::Model => 3,
            AssetKind::Particle => 4,
            AssetKind::Sound => 5,
            AssetKind::Raw => 6,
        }
    }

    /// Resolves a numeric code back to a kind.
    pub fn from_code(code: u16) -> Option<AssetKind> {
        match code {
            0 => Some(AssetKind::Texture),
            1 => Some(AssetKind::Material),
            2 => Some(AssetKind::Map),
            3 => Some(AssetKind::Model),
            4 => Some(AssetKind::Particle),
            5 => Some(AssetKind::Sound),
            6 => Some(AssetKind::Raw),
            _ => None,
        }
    }

    /// The display name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Texture => "Texture",
            AssetKind::Material => "Material",
            AssetKind::Map => "Map",
            AssetKind::Model => "Model",
            AssetKind::Particle => "Particle",
            AssetKind::Sound => "Sound",
            AssetKind::Raw => "Raw",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference to an asset known to the build.
///
/// `path` is the canonical `"package/name.ext"` form used for resolution,
/// import edges, and output file naming. The id is derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// The stable id derived from `path`.
    pub id: AssetId,
    /// The asset name within its package (e.g. `"main.mat"`).
    pub name: String,
    /// The canonical asset path (e.g. `"ui/main.mat"`).
    pub path: String,
    /// The package the asset belongs to (e.g. `"ui"`).
    pub package: String,
    /// The asset type.
    pub kind: AssetKind,
}

impl Asset {
    /// Creates an asset reference for the given path and kind.
    ///
    /// The package is the leading path component; the name is the remainder.
    /// A path with no separator gets the empty package.
    pub fn new(path: &str, kind: AssetKind) -> Asset {
        let (package, name) = match path.split_once('/') {
            Some((pkg, rest)) => (pkg.to_string(), rest.to_string()),
            None => (String::new(), path.to_string()),
        };
        Asset {
            id: AssetId::from_path(path),
            name,
            path: path.to_string(),
            package,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let a = AssetId::from_path("ui/main.mat");
        let b = AssetId::from_path("ui/main.mat");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_paths_distinct_ids() {
        assert_ne!(AssetId::from_path("tex/a.png"), AssetId::from_path("tex/b.png"));
    }

    #[test]
    fn new_splits_package_and_name() {
        let a = Asset::new("ui/main.mat", AssetKind::Material);
        assert_eq!(a.package, "ui");
        assert_eq!(a.name, "main.mat");
        assert_eq!(a.path, "ui/main.mat");
        assert_eq!(a.id, AssetId::from_path("ui/main.mat"));
    }

    #[test]
    fn new_nested_name_keeps_remainder() {
        let a = Asset::new("world/maps/e1m1.map", AssetKind::Map);
        assert_eq!(a.package, "world");
        assert_eq!(a.name, "maps/e1m1.map");
    }

    #[test]
    fn new_without_package() {
        let a = Asset::new("loose.png", AssetKind::Texture);
        assert_eq!(a.package, "");
        assert_eq!(a.name, "loose.png");
    }

    #[test]
    fn kind_codes_roundtrip() {
        for kind in [
            AssetKind::Texture,
            AssetKind::Material,
            AssetKind::Map,
            AssetKind::Model,
            AssetKind::Particle,
            AssetKind::Sound,
            AssetKind::Raw,
        ] {
            assert_eq!(AssetKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(AssetKind::from_code(999), None);
    }

    #[test]
    fn debug_format_is_hex() {
        let id = AssetId(0xdead_beef);
        assert_eq!(format!("{id:?}"), "AssetId(00000000deadbeef)");
    }
}
