//! Memoizing filesystem wrapper.

use super::{FileKind, FileSystem};
use crate::error::Result;
use crate::manifest::Manifest;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Memoizes `stat` and `read_manifest` of an inner filesystem.
///
/// Entries are never invalidated. Errors are passed through and not stored.
#[derive(Debug, Default)]
pub struct CachingFileSystem<F> {
    inner: F,
    stats: RwLock<HashMap<PathBuf, FileKind>>,
    manifests: RwLock<HashMap<PathBuf, Option<Arc<Manifest>>>>,
}

impl<F: FileSystem> CachingFileSystem<F> {
    #[must_use]
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            stats: RwLock::new(HashMap::new()),
            manifests: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped filesystem.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: FileSystem> FileSystem for CachingFileSystem<F> {
    fn stat(&self, path: &Path) -> io::Result<FileKind> {
        if let Some(kind) = self.stats.read().get(path) {
            return Ok(*kind);
        }

        let kind = self.inner.stat(path)?;
        self.stats.write().insert(path.to_path_buf(), kind);
        Ok(kind)
    }

    fn read_manifest(&self, path: &Path) -> Result<Option<Arc<Manifest>>> {
        if let Some(cached) = self.manifests.read().get(path) {
            return Ok(cached.clone());
        }

        let manifest = self.inner.read_manifest(path)?;
        self.manifests
            .write()
            .insert(path.to_path_buf(), manifest.clone());
        Ok(manifest)
    }
}
