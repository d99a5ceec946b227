//! Per-asset tag blobs stored in the package directory.
//!
//! Each asset's lump in a package file carries no payload, only a tag blob
//! describing it, all little-endian:
//!
//! ```text
//! ofs[5]: u32        absolute blob offsets of per-target tag data
//!                    (slot 0 generic, then one per platform; 0 = absent)
//! kind: u16          asset kind code
//! num_imports: u16
//! imports: u16[num_imports]   indices into the package @imports table
//! per-target tag bytes at the recorded offsets
//! ```

use kiln_common::{TargetMask, TargetPlatform};

use crate::error::PackError;

/// Tag slots: generic plus one per target platform.
pub const TAG_SLOTS: usize = 5;

const HEADER_FIXED: usize = TAG_SLOTS * 4 + 2 + 2;

/// The decoded form of an asset's package tag blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetTag {
    /// The asset kind code.
    pub kind: u16,
    /// Per-target tag data (slot 0 generic, then per platform).
    pub target_tags: [Option<Vec<u8>>; TAG_SLOTS],
    /// Indices into the package's `@imports` table.
    pub import_indices: Vec<u16>,
}

/// The tag slot for a target mask: 0 for generic, 1 + platform bit index
/// for a single platform.
pub fn tag_slot(target: TargetMask) -> usize {
    match target.first_target() {
        Some(p) if target == TargetMask::only(p) => 1 + platform_index(p),
        _ => 0,
    }
}

fn platform_index(p: TargetPlatform) -> usize {
    TargetMask::only(p).0.trailing_zeros() as usize
}

impl AssetTag {
    /// Creates an empty tag for an asset kind code.
    pub fn new(kind: u16) -> AssetTag {
        AssetTag {
            kind,
            ..AssetTag::default()
        }
    }

    /// Encodes the tag blob.
    pub fn encode(&self) -> Vec<u8> {
        let header_len = HEADER_FIXED + 2 * self.import_indices.len();
        let mut out = vec![0u8; header_len];

        out[TAG_SLOTS * 4..TAG_SLOTS * 4 + 2].copy_from_slice(&self.kind.to_le_bytes());
        out[TAG_SLOTS * 4 + 2..TAG_SLOTS * 4 + 4]
            .copy_from_slice(&(self.import_indices.len() as u16).to_le_bytes());
        for (i, idx) in self.import_indices.iter().enumerate() {
            let at = HEADER_FIXED + 2 * i;
            out[at..at + 2].copy_from_slice(&idx.to_le_bytes());
        }

        for (slot, tag) in self.target_tags.iter().enumerate() {
            if let Some(data) = tag {
                let ofs = out.len() as u32;
                out[slot * 4..slot * 4 + 4].copy_from_slice(&ofs.to_le_bytes());
                out.extend_from_slice(data);
            }
        }
        out
    }

    /// Decodes a tag blob.
    pub fn decode(data: &[u8]) -> Result<AssetTag, PackError> {
        let bad = |what: &str| PackError::Invalid(format!("asset tag: {what}"));
        if data.len() < HEADER_FIXED {
            return Err(bad("too short"));
        }

        let mut offsets = [0u32; TAG_SLOTS];
        for (slot, ofs) in offsets.iter_mut().enumerate() {
            *ofs = u32::from_le_bytes(data[slot * 4..slot * 4 + 4].try_into().unwrap());
        }

        let kind = u16::from_le_bytes(data[TAG_SLOTS * 4..TAG_SLOTS * 4 + 2].try_into().unwrap());
        let num_imports =
            u16::from_le_bytes(data[TAG_SLOTS * 4 + 2..TAG_SLOTS * 4 + 4].try_into().unwrap())
                as usize;

        if data.len() < HEADER_FIXED + 2 * num_imports {
            return Err(bad("truncated import indices"));
        }
        let import_indices = (0..num_imports)
            .map(|i| {
                let at = HEADER_FIXED + 2 * i;
                u16::from_le_bytes(data[at..at + 2].try_into().unwrap())
            })
            .collect();

        // Each slot's data runs to the next recorded offset (offsets are
        // assigned in slot order by encode) or the end of the blob.
        let mut target_tags: [Option<Vec<u8>>; TAG_SLOTS] = Default::default();
        let mut present: Vec<(usize, usize)> = offsets
            .iter()
            .enumerate()
            .filter(|(_, &o)| o != 0)
            .map(|(slot, &o)| (slot, o as usize))
            .collect();
        present.sort_by_key(|&(_, o)| o);

        for i in 0..present.len() {
            let (slot, start) = present[i];
            let end = present.get(i + 1).map(|&(_, o)| o).unwrap_or(data.len());
            if start > end || end > data.len() {
                return Err(bad("offset out of range"));
            }
            target_tags[slot] = Some(data[start..end].to_vec());
        }

        Ok(AssetTag {
            kind,
            target_tags,
            import_indices,
        })
    }
}
