//! The lump container: streamed entry payloads plus a trailing directory.
//!
//! File layout, all little-endian:
//!
//! ```text
//! sig: u32, magic: u32
//! entry payloads (each aligned, padded with a repeating "ALIGN" fill)
//! directory:
//!   count: u32
//!   per lump (sorted by name):
//!     ofs: u32, size: u32, tag_size: u32
//!     name_len: u16 (includes the NUL)
//!     name bytes + NUL, zero-padded so the 14-byte head plus name is
//!     8-aligned
//!     tag bytes, zero-padded to 8
//! dir_ofs: u32 (offset of count)
//! ```
//!
//! The directory is written last so payloads stream straight to disk; the
//! reader seeks to the trailing offset to find it.

use std::io::{self, Write};

use crate::error::PackError;

/// Signature of a pak archive.
pub const PAK_SIG: u32 = u32::from_le_bytes(*b"DPAK");
/// Magic of a pak archive.
pub const PAK_MAGIC: u32 = 0xA305_4028;

/// Signature of a per-package lump file.
pub const LUMP_SIG: u32 = u32::from_le_bytes(*b"plmp");
/// Magic of a per-package lump file.
pub const LUMP_MAGIC: u32 = 0x55BD_DECF;

/// Directory heads and tags are padded to this alignment.
const TAG_ALIGN: u32 = 8;

/// Longest lump name the directory accepts (excluding the NUL).
const MAX_NAME_LEN: usize = 1023;

/// The fill pattern used to align entry payloads.
const ALIGN_FILL: [u8; 5] = *b"ALIGN";

struct PendingLump {
    name: String,
    ofs: u32,
    size: u32,
    tag: Vec<u8>,
}

/// Streams lumps into a container, deferring the directory to the end.
pub struct LumpWriter<W: Write> {
    out: W,
    pos: u32,
    lumps: Vec<PendingLump>,
}

impl<W: Write> LumpWriter<W> {
    /// Starts a container by writing the signature and magic.
    pub fn begin(sig: u32, magic: u32, mut out: W) -> io::Result<LumpWriter<W>> {
        out.write_all(&sig.to_le_bytes())?;
        out.write_all(&magic.to_le_bytes())?;
        Ok(LumpWriter {
            out,
            pos: 8,
            lumps: Vec::new(),
        })
    }

    /// The number of lumps written so far.
    pub fn len(&self) -> usize {
        self.lumps.len()
    }

    /// Returns `true` if no lumps have been written.
    pub fn is_empty(&self) -> bool {
        self.lumps.is_empty()
    }

    /// Appends a lump payload, aligning it first. Zero-length payloads are
    /// legal (directory-only entries carrying just a tag). Returns the
    /// lump's index for [`set_tag`](Self::set_tag).
    pub fn write_lump(&mut self, name: &str, data: &[u8], align: u32) -> Result<usize, PackError> {
        debug_assert!(align.is_power_of_two());
        if name.len() > MAX_NAME_LEN {
            return Err(PackError::NameTooLong(name.to_string()));
        }

        let mut ofs = self.pos;
        if !data.is_empty() {
            let misaligned = ofs & (align - 1);
            if misaligned != 0 {
                self.write_align_fill(align - misaligned)?;
            }
            ofs = self.pos;
            self.write(data)?;
        }

        self.lumps.push(PendingLump {
            name: name.to_string(),
            ofs,
            size: data.len() as u32,
            tag: Vec::new(),
        });
        Ok(self.lumps.len() - 1)
    }

    /// Attaches tag data to a previously written lump.
    pub fn set_tag(&mut self, index: usize, tag: Vec<u8>) {
        self.lumps[index].tag = tag;
    }

    /// Sorts the directory by name and writes it, consuming the writer.
    /// Returns the underlying stream and the lump count.
    pub fn finish(mut self) -> io::Result<(W, u32)> {
        let dir_start = self.pos;
        self.lumps.sort_by(|a, b| a.name.cmp(&b.name));

        let count = self.lumps.len() as u32;
        self.write(&count.to_le_bytes())?;

        let lumps = std::mem::take(&mut self.lumps);
        for lump in &lumps {
            self.write(&lump.ofs.to_le_bytes())?;
            self.write(&lump.size.to_le_bytes())?;
            self.write(&(lump.tag.len() as u32).to_le_bytes())?;

            let name_len = (lump.name.len() + 1) as u16;
            self.write(&name_len.to_le_bytes())?;
            self.write(lump.name.as_bytes())?;
            self.write(&[0u8])?;

            // The 14-byte entry head plus the name pads to TAG_ALIGN.
            let head = 14 + name_len as u32;
            self.write_zero_pad(head)?;

            if !lump.tag.is_empty() {
                self.write(&lump.tag)?;
                self.write_zero_pad(lump.tag.len() as u32)?;
            }
        }

        self.write(&dir_start.to_le_bytes())?;
        self.out.flush()?;
        Ok((self.out, count))
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)?;
        self.pos += data.len() as u32;
        Ok(())
    }

    fn write_align_fill(&mut self, mut n: u32) -> io::Result<()> {
        while n >= ALIGN_FILL.len() as u32 {
            self.write(&ALIGN_FILL)?;
            n -= ALIGN_FILL.len() as u32;
        }
        if n > 0 {
            let part = &ALIGN_FILL[..n as usize];
            self.write(part)?;
        }
        Ok(())
    }

    fn write_zero_pad(&mut self, written: u32) -> io::Result<()> {
        let aligned = (written + TAG_ALIGN - 1) & !(TAG_ALIGN - 1);
        if aligned != written {
            let zeros = [0u8; (TAG_ALIGN - 1) as usize];
            self.write(&zeros[..(aligned - written) as usize])?;
        }
        Ok(())
    }
}

/// A lump entry resolved by the reader.
pub struct Lump<'a> {
    /// The lump name.
    pub name: &'a str,
    /// The payload bytes.
    pub data: &'a [u8],
    /// The tag bytes, empty when the lump has none.
    pub tag: &'a [u8],
}

struct ReadEntry {
    name: String,
    ofs: u32,
    size: u32,
    tag_ofs: usize,
    tag_size: u32,
}

/// Parses a lump container held in memory.
pub struct LumpReader {
    data: Vec<u8>,
    entries: Vec<ReadEntry>,
}

impl LumpReader {
    /// Parses a container, validating signature and magic.
    pub fn parse(sig: u32, magic: u32, data: Vec<u8>) -> Result<LumpReader, PackError> {
        if data.len() < 16 {
            return Err(PackError::Invalid("file too short".to_string()));
        }
        let file_sig = read_u32(&data, 0);
        let file_magic = read_u32(&data, 4);
        if file_sig != sig || file_magic != magic {
            return Err(PackError::Invalid(format!(
                "bad signature {file_sig:08x}/{file_magic:08x}"
            )));
        }

        let dir_ofs = read_u32(&data, data.len() - 4) as usize;
        if dir_ofs + 4 > data.len() {
            return Err(PackError::Invalid("directory offset out of range".to_string()));
        }

        let count = read_u32(&data, dir_ofs);
        let mut cursor = dir_ofs + 4;
        let mut entries = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let bad = || PackError::Invalid("truncated directory".to_string());
            if cursor + 14 > data.len() {
                return Err(bad());
            }
            let ofs = read_u32(&data, cursor);
            let size = read_u32(&data, cursor + 4);
            let tag_size = read_u32(&data, cursor + 8);
            let name_len =
                u16::from_le_bytes([data[cursor + 12], data[cursor + 13]]) as usize;
            if name_len == 0 || cursor + 14 + name_len > data.len() {
                return Err(bad());
            }

            let name_bytes = &data[cursor + 14..cursor + 14 + name_len - 1];
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| PackError::Invalid("non-UTF-8 lump name".to_string()))?
                .to_string();

            let head = (14 + name_len) as u32;
            cursor += align_up(head) as usize;

            let tag_ofs = cursor;
            cursor += align_up(tag_size) as usize;
            if cursor > data.len() {
                return Err(bad());
            }
            if ofs as usize + size as usize > data.len() {
                return Err(bad());
            }

            entries.push(ReadEntry {
                name,
                ofs,
                size,
                tag_ofs,
                tag_size,
            });
        }

        Ok(LumpReader { data, entries })
    }

    /// The number of lumps in the directory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The lump names in directory (sorted) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Looks up a lump by index.
    pub fn by_index(&self, i: usize) -> Option<Lump<'_>> {
        let e = self.entries.get(i)?;
        Some(Lump {
            name: &e.name,
            data: &self.data[e.ofs as usize..(e.ofs + e.size) as usize],
            tag: &self.data[e.tag_ofs..e.tag_ofs + e.tag_size as usize],
        })
    }

    /// Looks up a lump by name (case sensitive).
    pub fn by_name(&self, name: &str) -> Option<Lump<'_>> {
        let i = self
            .entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()?;
        self.by_index(i)
    }
}

fn read_u32(data: &[u8], ofs: usize) -> u32 {
    u32::from_le_bytes(data[ofs..ofs + 4].try_into().unwrap())
}

fn align_up(n: u32) -> u32 {
    (n + TAG_ALIGN - 1) & !(TAG_ALIGN - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(build: impl FnOnce(&mut LumpWriter<Vec<u8>>)) -> LumpReader {
        let mut w = LumpWriter::begin(PAK_SIG, PAK_MAGIC, Vec::new()).unwrap();
        build(&mut w);
        let (bytes, _) = w.finish().unwrap();
        LumpReader::parse(PAK_SIG, PAK_MAGIC, bytes).unwrap()
    }

    #[test]
    fn empty_container_roundtrips() {
        let r = roundtrip(|_| {});
        assert!(r.is_empty());
    }

    #[test]
    fn payloads_and_tags_roundtrip() {
        let r = roundtrip(|w| {
            let i = w.write_lump("b/two", b"payload-two", 8).unwrap();
            w.set_tag(i, vec![1, 2, 3]);
            w.write_lump("a/one", b"payload-one", 8).unwrap();
        });
        assert_eq!(r.len(), 2);

        let one = r.by_name("a/one").unwrap();
        assert_eq!(one.data, b"payload-one");
        assert!(one.tag.is_empty());

        let two = r.by_name("b/two").unwrap();
        assert_eq!(two.data, b"payload-two");
        assert_eq!(two.tag, &[1, 2, 3]);
    }

    #[test]
    fn directory_is_name_sorted() {
        let r = roundtrip(|w| {
            w.write_lump("zebra", b"z", 8).unwrap();
            w.write_lump("apple", b"a", 8).unwrap();
            w.write_lump("mango", b"m", 8).unwrap();
        });
        let names: Vec<&str> = r.names().collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn payloads_are_aligned() {
        let r = roundtrip(|w| {
            w.write_lump("a", b"xyz", 8).unwrap();
            w.write_lump("b", b"pqr", 8).unwrap();
        });
        for i in 0..r.len() {
            let e = &r.entries[i];
            assert_eq!(e.ofs % 8, 0, "lump {i} misaligned");
        }
    }

    #[test]
    fn zero_length_lump_with_tag() {
        let r = roundtrip(|w| {
            let i = w.write_lump("dir-only", &[], 4).unwrap();
            w.set_tag(i, vec![9; 13]);
        });
        let l = r.by_name("dir-only").unwrap();
        assert!(l.data.is_empty());
        assert_eq!(l.tag, &[9u8; 13][..]);
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut w = LumpWriter::begin(PAK_SIG, PAK_MAGIC, Vec::new()).unwrap();
        w.write_lump("a", b"x", 8).unwrap();
        let (bytes, _) = w.finish().unwrap();
        assert!(LumpReader::parse(LUMP_SIG, LUMP_MAGIC, bytes).is_err());
    }

    #[test]
    fn truncated_file_rejected() {
        assert!(LumpReader::parse(PAK_SIG, PAK_MAGIC, vec![0; 8]).is_err());
    }

    #[test]
    fn overlong_name_rejected() {
        let mut w = LumpWriter::begin(PAK_SIG, PAK_MAGIC, Vec::new()).unwrap();
        let name = "x".repeat(2000);
        assert!(matches!(
            w.write_lump(&name, b"d", 8),
            Err(PackError::NameTooLong(_))
        ));
    }
}
