//! Abstract random-access byte stream, plus little-endian read helpers.
//!
//! The core only ever needs open-read/read/seek/tell/length/close on a
//! byte-addressable medium. `FileByteSource` is the concrete adapter over
//! `std::fs::File`; anything implementing `ByteSource` (an in-memory buffer
//! for tests, say) can stand in for it.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

/// A random-access byte stream.
pub trait ByteSource {
    /// Read exactly `buf.len()` bytes, or fail.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Move the stream's cursor to an absolute byte offset.
    fn seek(&mut self, pos: u64) -> io::Result<()>;

    /// Current absolute cursor position.
    fn tell(&mut self) -> io::Result<u64>;

    /// Total length of the underlying medium, in bytes.
    fn length(&mut self) -> io::Result<u64>;
}

/// `ByteSource` backed by an open `std::fs::File`.
pub struct FileByteSource {
    file: File,
}

impl FileByteSource {
    /// Open `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

impl ByteSource for FileByteSource {
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn length(&mut self) -> io::Result<u64> {
        self.file.metadata().map(|m| m.len())
    }
}

/// Reads a little-endian `u16` from a `ByteSource`.
pub(crate) fn read_u16_le(src: &mut dyn ByteSource) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    src.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads a little-endian `u32` from a `ByteSource`.
pub(crate) fn read_u32_le(src: &mut dyn ByteSource) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    src.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
