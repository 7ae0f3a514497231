use super::{is_missing, FileKind, FileSystem};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Filesystem backed by `std::fs`, without caching.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileKind> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(FileKind::Directory),
            Ok(_) => Ok(FileKind::File),
            Err(e) if is_missing(&e) => Ok(FileKind::Missing),
            Err(e) => Err(e),
        }
    }

    fn read_manifest(&self, path: &Path) -> Result<Option<Arc<Manifest>>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(source) => {
                return Err(Error::ManifestRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Manifest::parse(path, &text).map(|m| Some(Arc::new(m)))
    }
}
