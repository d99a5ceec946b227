//! Directory packing into pak archives.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::PackError;
use crate::lump::{LumpWriter, PAK_MAGIC, PAK_SIG};

/// Version-control metadata directories never belong in an archive.
const SKIP_DIRS: [&str; 3] = [".svn", ".cvs", ".git"];

/// Packs every file under `dir` into the archive as `prefix` + relative
/// path, compressing entries that shrink.
///
/// A missing source directory packs nothing. Zero-length files are skipped
/// with a log line. An entry is stored compressed only when the zlib output
/// is strictly smaller than the input; the uncompressed size is then
/// recorded as the lump's 4-byte tag so the loader can size its buffer.
pub fn pack_directory<W: Write>(
    dir: &Path,
    prefix: &str,
    compression: u32,
    writer: &mut LumpWriter<W>,
    out: &mut dyn Write,
) -> Result<(), PackError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let mut files = Vec::new();
    collect_files(dir, PathBuf::new(), &mut files).map_err(|e| PackError::io(dir, e))?;
    files.sort();

    for rel in files {
        let path = dir.join(&rel);
        let name = format!("{prefix}{}", slash_path(&rel));
        let _ = write!(out, "{name}... ");

        let data = std::fs::read(&path).map_err(|e| PackError::io(&path, e))?;
        if data.is_empty() {
            let _ = writeln!(out, "(skipping zero length file)");
            continue;
        }

        let mut stored = false;
        if compression > 0 {
            let packed = deflate(&data, compression).ok_or_else(|| {
                PackError::Compression(name.clone())
            })?;
            if packed.len() < data.len() {
                let i = writer.write_lump(&name, &packed, 8)?;
                writer.set_tag(i, (data.len() as u32).to_le_bytes().to_vec());

                let ratio = (1.0 - packed.len() as f64 / data.len() as f64) * 100.0;
                let _ = writeln!(out, "({ratio:.1}%)");
                stored = true;
            }
        }

        if !stored {
            writer.write_lump(&name, &data, 8)?;
            let _ = writeln!(out, "(0%)");
        }
    }

    Ok(())
}

/// Writes one archive from a list of (directory, lump-name prefix) sources.
///
/// An archive that ends up with no lumps is deleted; shipping an empty
/// container would just confuse the loader's mount scan. Returns the lump
/// count.
pub fn write_archive(
    path: &Path,
    sources: &[(PathBuf, &str)],
    compression: u32,
    out: &mut dyn Write,
) -> Result<u32, PackError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| PackError::io(path, e))?;
    let mut writer = LumpWriter::begin(PAK_SIG, PAK_MAGIC, std::io::BufWriter::new(file))?;

    for (dir, prefix) in sources {
        pack_directory(dir, prefix, compression, &mut writer, out)?;
    }

    let (_, count) = writer.finish()?;
    let _ = writeln!(out, "wrote {count} file(s)");

    if count == 0 {
        let _ = writeln!(out, "deleting empty archive '{}'", path.display());
        std::fs::remove_file(path).map_err(|e| PackError::io(path, e))?;
    }
    Ok(count)
}

fn collect_files(
    dir: &Path,
    rel: PathBuf,
    files: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();

        if file_type.is_dir() {
            if SKIP_DIRS.iter().any(|s| name == *s) {
                continue;
            }
            collect_files(&entry.path(), rel.join(&name), files)?;
        } else if file_type.is_file() {
            files.push(rel.join(&name));
        }
    }
    Ok(())
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn deflate(data: &[u8], level: u32) -> Option<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::new(level));
    enc.write_all(data).ok()?;
    enc.finish().ok()
}
