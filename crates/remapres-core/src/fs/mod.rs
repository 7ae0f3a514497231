//! File system capability used by the resolver.
//!
//! The resolver only ever asks two questions of the filesystem: what kind of
//! entry lives at a path, and what manifest (if any) lives at a path. Both go
//! through [`FileSystem`] so callers can memoize them or substitute a test double.

mod caching;
mod memory;
mod real;

pub use caching::CachingFileSystem;
pub use memory::MemoryFileSystem;
pub use real::RealFileSystem;

use crate::error::Result;
use crate::manifest::Manifest;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Kind of entry at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Missing,
}

impl FileKind {
    #[must_use]
    pub fn exists(self) -> bool {
        !matches!(self, Self::Missing)
    }

    #[must_use]
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, Self::File)
    }
}

/// Filesystem operations consumed by the resolver.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Stat a path. Missing entries are `Ok(FileKind::Missing)`; any other
    /// failure (e.g. permission denied) is an error.
    fn stat(&self, path: &Path) -> io::Result<FileKind>;

    /// Read and parse a manifest file. `Ok(None)` when the file is missing.
    fn read_manifest(&self, path: &Path) -> Result<Option<Arc<Manifest>>>;
}

impl<F: FileSystem + ?Sized> FileSystem for Arc<F> {
    fn stat(&self, path: &Path) -> io::Result<FileKind> {
        (**self).stat(path)
    }

    fn read_manifest(&self, path: &Path) -> Result<Option<Arc<Manifest>>> {
        (**self).read_manifest(path)
    }
}

/// Whether an I/O error means "nothing is there".
///
/// A path running through a regular file (`a.js/b`) reports `ENOTDIR`,
/// which is as missing as `ENOENT` for resolution purposes.
pub(crate) fn is_missing(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }

    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ENOTDIR)
    }

    #[cfg(not(unix))]
    {
        false
    }
}
