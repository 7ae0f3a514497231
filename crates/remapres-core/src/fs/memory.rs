//! In-memory filesystem, mainly for tests.

use super::{FileKind, FileSystem};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A fixed in-memory tree of files and directories.
///
/// Parent directories of every file are created implicitly. Paths marked
/// unreadable fail every operation with `PermissionDenied`.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
    stat_calls: AtomicUsize,
    manifest_reads: AtomicUsize,
}

impl MemoryFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (and its parent directories).
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.files.insert(path, contents.into());
        self
    }

    /// Add an empty directory (and its parents).
    #[must_use]
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.dirs.insert(path);
        self
    }

    /// Mark a path as unreadable.
    #[must_use]
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.unreadable.insert(path);
        self
    }

    /// Number of `stat` calls served so far.
    pub fn stat_calls(&self) -> usize {
        self.stat_calls.load(Ordering::Relaxed)
    }

    /// Number of `read_manifest` calls served so far.
    pub fn manifest_reads(&self) -> usize {
        self.manifest_reads.load(Ordering::Relaxed)
    }

    fn add_parents(&mut self, path: &Path) {
        for parent in path.ancestors().skip(1) {
            if !parent.as_os_str().is_empty() {
                self.dirs.insert(parent.to_path_buf());
            }
        }
    }

    fn permission_denied(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("permission denied: {}", path.display()),
        )
    }
}

impl FileSystem for MemoryFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileKind> {
        self.stat_calls.fetch_add(1, Ordering::Relaxed);

        if self.unreadable.contains(path) {
            Err(Self::permission_denied(path))
        } else if self.files.contains_key(path) {
            Ok(FileKind::File)
        } else if self.dirs.contains(path) {
            Ok(FileKind::Directory)
        } else {
            Ok(FileKind::Missing)
        }
    }

    fn read_manifest(&self, path: &Path) -> Result<Option<Arc<Manifest>>> {
        self.manifest_reads.fetch_add(1, Ordering::Relaxed);

        if self.unreadable.contains(path) {
            return Err(Error::ManifestRead {
                path: path.to_path_buf(),
                source: Self::permission_denied(path),
            });
        }

        match self.files.get(path) {
            Some(text) => Manifest::parse(path, text).map(|m| Some(Arc::new(m))),
            None => Ok(None),
        }
    }
}
