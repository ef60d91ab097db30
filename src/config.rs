//! Mount-time configuration (SPEC_FULL.md §4.13).

use std::path::Path;

use crate::archive::Archive;
use crate::error::Result;

/// Options controlling how an archive is mounted.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Size, in bytes, of the compressed-data refill buffer each
    /// `ArchiveFile` allocates for DEFLATE entries. The original hardcodes
    /// 16 KiB; this is exposed since embedders reading from high-latency
    /// media (network, optical) may want a larger one.
    pub read_buffer_size: usize,
    /// Resolve every entry's local file header at mount time instead of on
    /// first access. Trades a slower, single up-front pass (one seek per
    /// entry) for `open_read`/`is_symlink`/`is_directory` calls that never
    /// pay resolution cost later. Symlink targets are still chased lazily
    /// within this eager pass, same as the on-demand path.
    pub eager_resolve: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 16 * 1024,
            eager_resolve: false,
        }
    }
}

impl OpenOptions {
    /// Mounts the ZIP archive at `path` with these options.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Archive> {
        Archive::open_with(path.as_ref(), self)
    }
}
