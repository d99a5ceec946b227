//! Target platforms and platform flag masks.
//!
//! Every cook pass runs either "generic" (platform-independent output shared
//! by all targets) or against exactly one platform. Cache keys, import edges,
//! and output directory trees are all qualified by a [`TargetMask`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A target platform the pipeline can produce output for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetPlatform {
    /// Desktop PC (Windows/Linux).
    Pc,
    /// Apple macOS.
    Mac,
    /// Apple iOS devices.
    Ios,
    /// Android devices.
    Android,
}

impl TargetPlatform {
    /// All platforms, in canonical (bit) order.
    pub const ALL: [TargetPlatform; 4] = [
        TargetPlatform::Pc,
        TargetPlatform::Mac,
        TargetPlatform::Ios,
        TargetPlatform::Android,
    ];

    /// The display name used in logs and cache key prefixes.
    pub fn name(&self) -> &'static str {
        match self {
            TargetPlatform::Pc => "PC",
            TargetPlatform::Mac => "Mac",
            TargetPlatform::Ios => "IOS",
            TargetPlatform::Android => "Android",
        }
    }

    /// The lowercase name used for output directories and pak file names.
    pub fn dir_name(&self) -> &'static str {
        match self {
            TargetPlatform::Pc => "pc",
            TargetPlatform::Mac => "mac",
            TargetPlatform::Ios => "ios",
            TargetPlatform::Android => "android",
        }
    }

    /// The bit this platform occupies in a [`TargetMask`].
    pub fn bit(&self) -> u8 {
        match self {
            TargetPlatform::Pc => 1 << 0,
            TargetPlatform::Mac => 1 << 1,
            TargetPlatform::Ios => 1 << 2,
            TargetPlatform::Android => 1 << 3,
        }
    }

    /// Parses a platform from its configuration name (case-insensitive).
    pub fn parse(s: &str) -> Option<TargetPlatform> {
        match s.to_ascii_lowercase().as_str() {
            "pc" => Some(TargetPlatform::Pc),
            "mac" => Some(TargetPlatform::Mac),
            "ios" => Some(TargetPlatform::Ios),
            "android" => Some(TargetPlatform::Android),
            _ => None,
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of target platforms, stored as a bitmask.
///
/// The empty mask means "generic": output that is shared by every platform.
/// Import edges carry the mask of platforms under which they apply, and the
/// staleness cache namespaces its keys by the platform a value was recorded
/// for.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetMask(pub u8);

impl TargetMask {
    /// The empty (generic) mask.
    pub const GENERIC: TargetMask = TargetMask(0);

    /// The mask containing every platform.
    pub const ALL: TargetMask = TargetMask(0b1111);

    /// Creates a mask containing a single platform.
    pub fn only(platform: TargetPlatform) -> TargetMask {
        TargetMask(platform.bit())
    }

    /// Returns `true` if the mask contains no platforms (generic output).
    pub fn is_generic(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the mask contains the given platform.
    pub fn contains(&self, platform: TargetPlatform) -> bool {
        self.0 & platform.bit() != 0
    }

    /// Returns the union of two masks.
    pub fn union(&self, other: TargetMask) -> TargetMask {
        TargetMask(self.0 | other.0)
    }

    /// Returns the intersection of two masks.
    pub fn intersect(&self, other: TargetMask) -> TargetMask {
        TargetMask(self.0 & other.0)
    }

    /// Iterates over the platforms contained in the mask, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = TargetPlatform> + '_ {
        TargetPlatform::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }

    /// Returns the first platform in the mask, in canonical order.
    ///
    /// Used by cookers that produce one output shared by every platform in a
    /// multi-platform pass.
    pub fn first_target(&self) -> Option<TargetPlatform> {
        self.iter().next()
    }

    /// The cache-key prefix for this mask: `"<Platform>/"` for a
    /// single-platform mask, `"Generic/"` otherwise.
    pub fn key_prefix(&self) -> String {
        match self.first_target() {
            Some(p) if self.0 == p.bit() => format!("{}/", p.name()),
            _ => "Generic/".to_string(),
        }
    }
}

impl fmt::Debug for TargetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_generic() {
            return f.write_str("TargetMask(Generic)");
        }
        let names: Vec<&str> = self.iter().map(|p| p.name()).collect();
        write!(f, "TargetMask({})", names.join("|"))
    }
}

impl fmt::Display for TargetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_generic() {
            return f.write_str("Generic");
        }
        let mut sep = false;
        for p in self.iter() {
            if sep {
                f.write_str("|")?;
            }
            f.write_str(p.name())?;
            sep = true;
        }
        Ok(())
    }
}
