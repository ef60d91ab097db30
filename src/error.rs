//! Error types for zip-vfs

use thiserror::Error;

/// Result type for zip-vfs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Categories `zlib_err` in the PhysicsFS original distinguishes. Only the
/// two flate2 can actually surface for a raw (no zlib header) inflater over
/// a byte-oriented stream are kept: `NeedDict` only applies to zlib-wrapped
/// streams with a preset dictionary (never the case here), and `Mem`/
/// `Version` correspond to allocation and zlib-version checks that flate2's
/// safe API doesn't expose as distinguishable error paths — keeping them
/// as unreachable variants would just be a facade over the same two real
/// cases.
#[derive(Debug, Error)]
pub enum InflateError {
    /// The compressed stream is invalid (bad block header, bad checksum,
    /// or the stream ended before its declared size was reached).
    #[error("invalid DEFLATE stream")]
    Data,
    /// The inflater stalled: no more compressed input is available and no
    /// further output could be produced without it.
    #[error("inflater made no progress")]
    Buf,
}

/// Error type for all zip-vfs operations
#[derive(Debug, Error)]
pub enum Error {
    /// No local file header signature, and no end-of-central-directory
    /// record could be located either.
    #[error("not an archive")]
    NotAnArchive,

    /// The archive uses a ZIP feature this crate doesn't implement
    /// (spanning, ZIP64, or an EOCD/central-directory inconsistency).
    #[error("unsupported archive: {reason}")]
    UnsupportedArchive {
        /// Human-readable reason, for diagnostics only.
        reason: &'static str,
    },

    /// A header, or the data it points at, failed validation.
    #[error("corrupted archive: {reason}")]
    Corrupted {
        /// Human-readable reason, for diagnostics only.
        reason: &'static str,
    },

    /// Resolving a symlink re-entered an entry already being resolved.
    #[error("symlink loop at {path}")]
    SymlinkLoop {
        /// Path of the entry where the cycle was detected.
        path: String,
    },

    /// No entry with this name exists in the archive.
    #[error("no such file: {path}")]
    NoSuchFile {
        /// The path that was looked up.
        path: String,
    },

    /// `is_directory` chased a symlink to a non-directory target.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that was queried.
        path: String,
    },

    /// A read or seek went past the entry's uncompressed length.
    #[error("past end of file")]
    PastEof,

    /// Entry uses a compression method other than STORE (0) or DEFLATE (8).
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// An allocation failed while mounting or opening an entry. Kept for
    /// parity with spec.md §7's error table; Rust's global allocator aborts
    /// the process on allocation failure rather than returning an error, so
    /// this variant is not constructed in practice by this crate's own
    /// code — it exists for callers building on an allocator that can
    /// report failure instead of aborting.
    #[error("out of memory")]
    OutOfMemory,

    /// The underlying byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The DEFLATE inflater failed.
    #[error("inflate error: {0}")]
    Inflate(#[from] InflateError),
}

impl Error {
    pub(crate) fn corrupted(reason: &'static str) -> Self {
        Error::Corrupted { reason }
    }

    pub(crate) fn unsupported(reason: &'static str) -> Self {
        Error::UnsupportedArchive { reason }
    }
}
