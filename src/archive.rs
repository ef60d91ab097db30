//! The mounted archive: entry lookup, directory queries, enumeration, and
//! opening member files for reading (spec §4.7).

use std::path::{Path, PathBuf};

use crate::byte_source::FileByteSource;
use crate::central_dir::parse_archive;
use crate::config::OpenOptions;
use crate::entry::ResolveState;
use crate::error::{Error, Result};
use crate::index::{Index, NameSink};
use crate::reader::ArchiveFile;
use crate::resolver::resolve;

/// A mounted, read-only ZIP archive.
///
/// `Archive` owns the parsed, sorted entry table. It is not `Sync`: the
/// resolution path mutates entries through `&mut self`, so sharing one
/// `Archive` across threads needs external synchronization (spec §5,
/// policy (a)).
pub struct Archive {
    path: PathBuf,
    index: Index,
    read_buffer_size: usize,
}

impl Archive {
    /// Mounts `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        OpenOptions::default().open(path)
    }

    /// Checks whether `path` looks like a ZIP archive (spec §4.1), without
    /// fully mounting it. A plain archive is detected from its first four
    /// bytes; an archive preceded by arbitrary data (a self-extractor, say)
    /// is detected by successfully locating its end-of-central-directory
    /// record.
    pub fn is_archive(path: impl AsRef<Path>) -> Result<bool> {
        let mut src = FileByteSource::open(path)?;
        Ok(crate::eocd::is_archive(&mut src))
    }

    pub(crate) fn open_with(path: &Path, options: &OpenOptions) -> Result<Self> {
        let mut src = FileByteSource::open(path)?;
        let entries = parse_archive(&mut src)?;
        let mut index = Index::new(entries);

        if options.eager_resolve {
            for i in 0..index.len() {
                if matches!(
                    index.entries()[i].resolved,
                    ResolveState::UnresolvedFile | ResolveState::UnresolvedSymlink
                ) {
                    // Best-effort: a broken entry is recorded in its state
                    // and only surfaces an error if something tries to
                    // open it later, matching the lazy path's behavior.
                    let _ = resolve(&mut index, i, &mut src);
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            index,
            read_buffer_size: options.read_buffer_size,
        })
    }

    /// The path this archive was mounted from.
    pub fn archive_name(&self) -> &Path {
        &self.path
    }

    /// True iff an entry named `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.index.find_entry(name).is_some()
    }

    /// The entry's last-modified time, as seconds since the Unix epoch.
    pub fn get_last_mod_time(&self, name: &str) -> Result<i64> {
        let idx = self.find_entry_or_fail(name)?;
        Ok(self.index.entries()[idx].last_mod_time)
    }

    /// The entry's CRC-32 of its uncompressed data, as stored in the
    /// central directory (spec §8: read-back bytes must hash to this).
    pub fn get_crc32(&self, name: &str) -> Result<u32> {
        let idx = self.find_entry_or_fail(name)?;
        Ok(self.index.entries()[idx].crc32)
    }

    /// True iff `name` is a symlink (resolved or not).
    pub fn is_symlink(&self, name: &str) -> Result<bool> {
        let idx = self.find_entry_or_fail(name)?;
        Ok(self.index.entries()[idx].is_symlink())
    }

    /// True iff `name` names a directory: either it has entries nested
    /// under it, or it's a symlink whose final target does.
    pub fn is_directory(&mut self, name: &str) -> Result<bool> {
        if self.index.find_start_of_dir(name, true).is_some() {
            return Ok(true);
        }

        let idx = self.find_entry_or_fail(name)?;
        if !self.index.entries()[idx].is_symlink() {
            return Ok(false);
        }

        let mut src = FileByteSource::open(&self.path)?;
        resolve(&mut self.index, idx, &mut src)?;
        let target_idx = self.index.entries()[idx]
            .symlink_target
            .expect("resolved symlink always records a target");
        let target_name = self.index.entries()[target_idx].name.clone();
        if self.index.find_start_of_dir(&target_name, true).is_some() {
            Ok(true)
        } else {
            Err(Error::NotADirectory { path: name.to_string() })
        }
    }

    /// Appends each immediate child's basename under `dir`, exactly once,
    /// in sorted order (spec §4.8).
    pub fn enumerate_files(&self, dir: &str, omit_symlinks: bool, sink: &mut dyn NameSink) {
        self.index.enumerate(dir, omit_symlinks, sink);
    }

    /// Resolves `name` and opens an independent read handle onto its data.
    /// If `name` is a symlink, the handle operates on the symlink's final,
    /// non-symlink target.
    pub fn open_read(&mut self, name: &str) -> Result<ArchiveFile> {
        let idx = self.find_entry_or_fail(name)?;

        let mut resolve_src = FileByteSource::open(&self.path)?;
        resolve(&mut self.index, idx, &mut resolve_src)?;

        let target_idx = self.index.entries()[idx].symlink_target.unwrap_or(idx);
        let entry = &self.index.entries()[target_idx];

        let handle_src = Box::new(FileByteSource::open(&self.path)?);
        ArchiveFile::open(entry, handle_src, self.read_buffer_size)
    }

    fn find_entry_or_fail(&self, name: &str) -> Result<usize> {
        self.index.find_entry(name).ok_or_else(|| Error::NoSuchFile {
            path: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn write_store_entry(buf: &mut Vec<u8>, name: &str, data: &[u8], external_attr: u32, version_made_by: u16) -> u32 {
        let offset = buf.len() as u32;
        buf.extend_from_slice(&0x0403_4B50u32.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // method: store
        buf.extend_from_slice(&0u32.to_le_bytes()); // dos time
        let crc = crc32fast::hash(data);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra len
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(data);
        let _ = (external_attr, version_made_by);
        offset
    }

    /// Builds a minimal single-entry STORE archive in memory and writes it
    /// to a temp file, returning (path, local_header_offset, data bytes).
    fn build_minimal_archive(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
        let mut buf = Vec::new();
        let offset = write_store_entry(&mut buf, name, data, 0, 0);

        let cd_start = buf.len() as u32;
        buf.extend_from_slice(&0x0201_4B50u32.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // version made by (host 0 = FAT, doesn't matter here)
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // method
        buf.extend_from_slice(&0u32.to_le_bytes()); // dos time
        let crc = crc32fast::hash(data);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra len
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment len
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        buf.extend_from_slice(&0u16.to_le_bytes()); // internal attr
        buf.extend_from_slice(&0u32.to_le_bytes()); // external attr
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        let cd_size = buf.len() as u32 - cd_start;

        buf.extend_from_slice(&0x0605_4B50u32.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_start.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment len

        let path = dir.path().join("minimal.zip");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&buf).unwrap();
        path
    }

    #[test]
    fn minimal_store_archive_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_minimal_archive(&dir, "hello.txt", b"Hello, World!\n");

        let mut archive = Archive::open(&path).unwrap();
        assert!(archive.exists("hello.txt"));
        assert!(!archive.exists("nope.txt"));

        let mut file = archive.open_read("hello.txt").unwrap();
        assert_eq!(file.file_length(), 14);
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"Hello, World!\n");
    }

    #[test]
    fn prepended_bytes_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_minimal_archive(&dir, "hello.txt", b"Hello, World!\n");
        let mut zip_bytes = std::fs::read(&path).unwrap();
        let mut prefixed = vec![0xAAu8; 4096];
        prefixed.append(&mut zip_bytes);
        std::fs::write(&path, &prefixed).unwrap();

        let mut archive = Archive::open(&path).unwrap();
        assert!(archive.exists("hello.txt"));
        let mut file = archive.open_read("hello.txt").unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"Hello, World!\n");
    }
}
