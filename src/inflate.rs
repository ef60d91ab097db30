//! A thin push-input/pull-output wrapper over flate2's raw (no zlib header)
//! DEFLATE inflater, satisfying the abstract inflater contract spec §2's
//! module map describes (init/reset, push-input/pull-output, finalize).
//! Used both by symlink-target resolution (one-shot, §4.9 step 3) and the
//! streaming reader (incremental, §4.12).

use flate2::{Decompress, FlushDecompress, Status};

use crate::byte_source::ByteSource;
use crate::error::{Error, InflateError, Result};

/// Bytes read from the archive per refill by [`inflate_all`]. The streaming
/// reader uses its own caller-configurable buffer size instead.
const ONE_SHOT_BUFFER_SIZE: usize = 16 * 1024;

/// Owns one `flate2::Decompress` state machine. `false` below (no zlib
/// header/trailer) is the "negative window bits" raw-DEFLATE mode spec
/// §4.12 calls for.
pub(crate) struct Inflater {
    decompress: Decompress,
}

impl Inflater {
    pub(crate) fn new() -> Self {
        Self {
            decompress: Decompress::new(false),
        }
    }

    /// Reinitializes the inflater in place, discarding any buffered state,
    /// so a fresh stream can be decoded from the start (spec §4.12 seek:
    /// "reset the inflater state"). §9's design notes call for resetting
    /// in place rather than reallocating a new inflater.
    pub(crate) fn reset(&mut self) {
        self.decompress.reset(false);
    }

    /// Pushes as much of `input` as progresses the stream and pulls
    /// decompressed bytes into `output`. Returns `(bytes_consumed,
    /// bytes_produced, finished)`; `finished` is true once the DEFLATE
    /// end-of-stream marker is reached (a normal termination, not an
    /// error). An input/output pair that makes no progress at all is the
    /// "no progress possible" stall case and surfaces as
    /// `InflateError::Buf`; a malformed stream surfaces as
    /// `InflateError::Data`.
    pub(crate) fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize, bool)> {
        let before_in = self.decompress.total_in();
        let before_out = self.decompress.total_out();

        let status = self
            .decompress
            .decompress(input, output, FlushDecompress::Sync)
            .map_err(|_| Error::Inflate(InflateError::Data))?;

        let consumed = (self.decompress.total_in() - before_in) as usize;
        let produced = (self.decompress.total_out() - before_out) as usize;

        match status {
            Status::StreamEnd => Ok((consumed, produced, true)),
            Status::Ok if consumed == 0 && produced == 0 && !input.is_empty() && !output.is_empty() => {
                Err(Error::Inflate(InflateError::Buf))
            }
            Status::Ok => Ok((consumed, produced, false)),
            Status::BufError => Err(Error::Inflate(InflateError::Buf)),
        }
    }
}

/// Decompresses exactly `compressed_size` bytes of raw DEFLATE data at the
/// source's current position into a freshly allocated buffer of
/// `uncompressed_size` bytes. Used for symlink targets, which are always
/// read to completion rather than streamed.
pub(crate) fn inflate_all(src: &mut dyn ByteSource, compressed_size: u32, uncompressed_size: u32) -> Result<Vec<u8>> {
    let mut inflater = Inflater::new();
    let mut compressed_remaining = compressed_size as u64;
    let mut in_buf = vec![0u8; ONE_SHOT_BUFFER_SIZE];
    let mut out_buf = vec![0u8; ONE_SHOT_BUFFER_SIZE];
    let mut out = Vec::with_capacity(uncompressed_size as usize);

    let mut pending: &[u8] = &[];
    loop {
        if pending.is_empty() && compressed_remaining > 0 {
            let want = (in_buf.len() as u64).min(compressed_remaining) as usize;
            let n = src.read(&mut in_buf[..want])?;
            if n == 0 {
                return Err(Error::Inflate(InflateError::Data));
            }
            compressed_remaining -= n as u64;
            pending = &in_buf[..n];
        }

        let (consumed, produced, finished) = inflater.inflate(pending, &mut out_buf)?;
        out.extend_from_slice(&out_buf[..produced]);
        pending = &pending[consumed..];

        if finished {
            return Ok(out);
        }
        if pending.is_empty() && compressed_remaining == 0 {
            return Err(Error::Inflate(InflateError::Data));
        }
    }
}
