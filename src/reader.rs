//! The streaming per-entry reader, `ArchiveFile` (spec §4.12).

use std::io::{self, Read};

use crate::byte_source::ByteSource;
use crate::entry::Entry;
use crate::error::Error;
use crate::error::Result;
use crate::inflate::Inflater;

/// Discard-buffer size used to fast-forward a DEFLATE stream on a forward
/// seek once the backing stream has been restarted.
const SKIP_BUFFER_SIZE: usize = 512;

/// Wraps an [`Error`] so it can travel through `std::io::Read`'s
/// `io::Result` signature without losing the original categorization (a
/// caller can still recover it via `io::Error::get_ref`/`into_inner`).
fn io_err(err: Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// DEFLATE entry state: an independent `ByteSource` handle bounded to the
/// entry's compressed byte range, a private inflater, and a fixed-size
/// compressed-read refill buffer — matching spec §2 component 6 exactly
/// ("holds an inflater... plus a fixed-size compressed-read buffer").
struct DeflateBody {
    src: Box<dyn ByteSource + Send>,
    compressed_size: u64,
    compressed_position: u64,
    inflater: Inflater,
    in_buf: Vec<u8>,
    in_buf_pos: usize,
    in_buf_len: usize,
    finished: bool,
}

impl DeflateBody {
    fn new(src: Box<dyn ByteSource + Send>, compressed_size: u64, buffer_size: usize) -> Self {
        Self {
            src,
            compressed_size,
            compressed_position: 0,
            inflater: Inflater::new(),
            in_buf: vec![0u8; buffer_size.max(1)],
            in_buf_pos: 0,
            in_buf_len: 0,
            finished: false,
        }
    }

    /// Pumps the inflater until `out` is full, the stream ends, or no more
    /// compressed input is available (spec §4.12 `read`, DEFLATE branch).
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < out.len() && !self.finished {
            if self.in_buf_pos == self.in_buf_len {
                if self.compressed_position >= self.compressed_size {
                    return Err(io_err(Error::corrupted(
                        "deflate stream ended before its declared compressed size was reached",
                    )));
                }
                let want = ((self.compressed_size - self.compressed_position) as usize).min(self.in_buf.len());
                let n = self.src.read(&mut self.in_buf[..want])?;
                if n == 0 {
                    return Err(io_err(Error::corrupted("archive truncated while reading compressed data")));
                }
                self.compressed_position += n as u64;
                self.in_buf_len = n;
                self.in_buf_pos = 0;
            }

            let input = &self.in_buf[self.in_buf_pos..self.in_buf_len];
            let (consumed, produced, finished) = self.inflater.inflate(input, &mut out[total..]).map_err(io_err)?;
            self.in_buf_pos += consumed;
            total += produced;
            if finished {
                self.finished = true;
            }
        }
        Ok(total)
    }

    /// Resets the inflater in place and rewinds both the compressed-data
    /// cursor and the refill buffer, so decoding can restart from the
    /// beginning of the entry's data (spec §4.12 `seek`, backward case;
    /// spec §9 "Inflater lifecycle": reset in place, don't reallocate).
    fn restart(&mut self, data_offset: u64) -> Result<()> {
        self.src.seek(data_offset)?;
        self.compressed_position = 0;
        self.in_buf_pos = 0;
        self.in_buf_len = 0;
        self.finished = false;
        self.inflater.reset();
        Ok(())
    }
}

enum Body {
    Store(Box<dyn ByteSource + Send>),
    Deflate(DeflateBody),
}

/// An open handle onto one archive member's decompressed data stream.
///
/// Each `ArchiveFile` owns an independent [`ByteSource`] handle (spec §5),
/// so two open files never share a seek cursor.
pub struct ArchiveFile {
    data_offset: u64,
    uncompressed_size: u64,
    uncompressed_position: u64,
    body: Body,
    past_eof: bool,
}

impl ArchiveFile {
    /// Opens a fresh handle on `entry`'s (already-resolved) data, taking
    /// ownership of an independent `ByteSource` seeked to nothing in
    /// particular yet — this call seeks it itself. `buffer_size` is the
    /// DEFLATE compressed-data refill size (`OpenOptions::read_buffer_size`).
    pub(crate) fn open(entry: &Entry, mut src: Box<dyn ByteSource + Send>, buffer_size: usize) -> Result<Self> {
        let data_offset = entry.offset as u64;
        src.seek(data_offset)?;

        let body = match entry.compression_method {
            0 => Body::Store(src),
            8 => Body::Deflate(DeflateBody::new(src, entry.compressed_size as u64, buffer_size)),
            other => return Err(Error::UnsupportedCompression(other)),
        };

        Ok(Self {
            data_offset,
            uncompressed_size: entry.uncompressed_size as u64,
            uncompressed_position: 0,
            body,
            past_eof: false,
        })
    }

    /// Whether the previous `read` delivered fewer bytes than requested
    /// because it reached the end of the entry's uncompressed data.
    pub fn eof(&self) -> bool {
        self.past_eof
    }

    /// Current position within the entry's uncompressed data.
    pub fn tell(&self) -> u64 {
        self.uncompressed_position
    }

    /// Total uncompressed length of the entry.
    pub fn file_length(&self) -> u64 {
        self.uncompressed_size
    }

    /// Moves the read cursor to an absolute uncompressed-data offset
    /// (spec §4.12 `seek`).
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.uncompressed_size {
            return Err(Error::PastEof);
        }

        match &mut self.body {
            Body::Store(src) => {
                src.seek(self.data_offset + offset)?;
                self.uncompressed_position = offset;
            }
            Body::Deflate(body) => {
                if offset < self.uncompressed_position {
                    log::trace!(
                        "deflate backward seek from {} to {}: restarting stream",
                        self.uncompressed_position,
                        offset
                    );
                    body.restart(self.data_offset)?;
                    self.uncompressed_position = 0;
                }
                let mut discard = [0u8; SKIP_BUFFER_SIZE];
                while self.uncompressed_position < offset {
                    let want = (offset - self.uncompressed_position).min(SKIP_BUFFER_SIZE as u64) as usize;
                    let n = self.read(&mut discard[..want])?;
                    if n == 0 {
                        break;
                    }
                }
            }
        }

        self.past_eof = false;
        Ok(())
    }
}

impl Read for ArchiveFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let avail = self.uncompressed_size - self.uncompressed_position;
        let want = (buf.len() as u64).min(avail) as usize;
        self.past_eof = (buf.len() as u64) > avail;

        if want == 0 {
            return Ok(0);
        }

        let n = match &mut self.body {
            Body::Store(src) => src.read(&mut buf[..want])?,
            Body::Deflate(body) => body.read(&mut buf[..want])?,
        };

        self.uncompressed_position += n as u64;
        Ok(n)
    }
}
