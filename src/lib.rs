//! # zip-vfs: a read-only ZIP archive backend for a virtual filesystem
//!
//! Mount a `.zip` file and treat it as a directory tree: look up entries by
//! path, enumerate a directory's children, follow Unix symlinks stored in
//! the archive, and stream an entry's (optionally DEFLATE-compressed) bytes
//! through `std::io::Read` and an explicit `seek`.
//!
//! ZIP64 archives, archive writing, and spanned (multi-disk) archives are
//! out of scope — see the crate's design notes for the full rationale.
//!
//! ## Quick start
//!
//! ```no_run
//! use zip_vfs::Archive;
//! use std::io::Read;
//!
//! let mut archive = Archive::open("archive.zip")?;
//! assert!(archive.exists("hello.txt"));
//!
//! let mut file = archive.open_read("hello.txt")?;
//! let mut contents = String::new();
//! file.read_to_string(&mut contents)?;
//! # Ok::<(), zip_vfs::Error>(())
//! ```
//!
//! Enumerating a directory and checking whether a name is itself a
//! directory:
//!
//! ```no_run
//! # use zip_vfs::Archive;
//! let mut archive = Archive::open("archive.zip")?;
//! let mut names = Vec::new();
//! archive.enumerate_files("assets", false, &mut names);
//! assert!(archive.is_directory("assets")?);
//! # Ok::<(), zip_vfs::Error>(())
//! ```

pub mod archive;
pub mod byte_source;
pub mod central_dir;
pub mod config;
pub mod entry;
pub mod eocd;
pub mod error;
pub mod index;
mod inflate;
pub mod reader;
pub mod resolver;

pub use archive::Archive;
pub use byte_source::{ByteSource, FileByteSource};
pub use config::OpenOptions;
pub use entry::{Entry, ResolveState};
pub use error::{Error, InflateError, Result};
pub use index::NameSink;
pub use reader::ArchiveFile;
