//! Platform remap tables.
//!
//! A manifest may declare that, for the alternate platform, one file is
//! replaced by another or by nothing at all. Declarations from every ancestor
//! directory are flattened into one [`RemapTable`] per starting directory; the
//! closest declaring directory wins on conflicting keys.

use super::engine::Resolver;
use crate::error::{Error, RemapRole, Result};
use crate::manifest::{Manifest, RemapDeclaration, RemapValue};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Where a remapped file goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemapTarget {
    /// Another absolute path.
    Path(PathBuf),
    /// No module; serve an empty one.
    Empty,
}

impl RemapTarget {
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Empty => None,
        }
    }
}

impl Serialize for RemapTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Path(p) => p.serialize(serializer),
            Self::Empty => serializer.serialize_bool(false),
        }
    }
}

/// Absolute source path -> remap target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RemapTable {
    entries: HashMap<PathBuf, RemapTarget>,
}

impl RemapTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry.
    pub fn insert(&mut self, source: impl Into<PathBuf>, target: RemapTarget) {
        self.entries.insert(source.into(), target);
    }

    #[must_use]
    pub fn get(&self, source: &Path) -> Option<&RemapTarget> {
        self.entries.get(source)
    }

    #[must_use]
    pub fn contains(&self, source: &Path) -> bool {
        self.entries.contains_key(source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &RemapTarget)> {
        self.entries.iter()
    }

    /// Copy in entries from `other` whose keys are not present yet.
    pub fn fill_missing(&mut self, other: &RemapTable) {
        for (source, target) in &other.entries {
            self.entries
                .entry(source.clone())
                .or_insert_with(|| target.clone());
        }
    }

    /// Copy in every entry from `other`, replacing existing keys.
    pub fn overlay(&mut self, other: &RemapTable) {
        for (source, target) in &other.entries {
            self.entries.insert(source.clone(), target.clone());
        }
    }
}

impl FromIterator<(PathBuf, RemapTarget)> for RemapTable {
    fn from_iter<I: IntoIterator<Item = (PathBuf, RemapTarget)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Resolver {
    /// The flattened remap table for `start_dir`: its own declarations plus
    /// those of every ancestor, closer directories taking precedence.
    pub fn load_remap_table(&self, start_dir: &Path) -> Result<Arc<RemapTable>> {
        let start_dir = self.absolute_dir(start_dir)?;
        self.caches
            .flattened
            .get_or_try_insert_with(start_dir.clone(), || {
                let mut table = RemapTable::new();
                for dir in start_dir.ancestors() {
                    if let Some(declared) = self.declared_remaps(dir)? {
                        table.fill_missing(&declared);
                    }
                }
                debug!(dir = %start_dir.display(), entries = table.len(), "Built remap table");
                Ok(Arc::new(table))
            })
    }

    /// Remaps declared by `dir`'s own manifest, or `None` if it declares none.
    fn declared_remaps(&self, dir: &Path) -> Result<Option<Arc<RemapTable>>> {
        self.caches
            .declared
            .get_or_try_insert_with(dir.to_path_buf(), || {
                let Some(manifest) = self.read_manifest(dir)? else {
                    return Ok(None);
                };
                let config = self.config();
                let Some(decl) = manifest.remap_declaration(
                    &config.remap_field,
                    config.legacy_remap_field.as_deref(),
                )?
                else {
                    return Ok(None);
                };
                let table = self.build_declared(dir, &manifest, decl)?;
                Ok(Some(Arc::new(table)))
            })
    }

    fn build_declared(
        &self,
        dir: &Path,
        manifest: &Manifest,
        decl: RemapDeclaration,
    ) -> Result<RemapTable> {
        let mut table = RemapTable::new();

        match decl {
            RemapDeclaration::Main(_) | RemapDeclaration::Disabled => {
                let main = self.try_resolve_main(dir, &mut None)?.ok_or_else(|| {
                    Error::UnresolvedMain {
                        field: self.config().remap_field.clone(),
                        manifest: manifest.path().to_path_buf(),
                        dir: dir.to_path_buf(),
                    }
                })?;
                let target = match decl {
                    RemapDeclaration::Main(target) => {
                        self.resolve_remap_target(dir, manifest, &target)?
                    }
                    _ => RemapTarget::Empty,
                };
                trace!(source = %main.display(), ?target, "Main remap");
                table.insert(main, target);
            }
            RemapDeclaration::Map(entries) => {
                for (source, value) in entries {
                    let resolved_source = self
                        .resolve_remap_specifier(dir, &source)?
                        .ok_or_else(|| self.unresolved(manifest, &source, RemapRole::Source))?;
                    let target = match value {
                        RemapValue::Disabled => RemapTarget::Empty,
                        RemapValue::Specifier(target) => {
                            self.resolve_remap_target(dir, manifest, &target)?
                        }
                    };
                    trace!(source = %resolved_source.display(), ?target, "Remap entry");
                    table.insert(resolved_source, target);
                }
            }
        }

        Ok(table)
    }

    fn resolve_remap_target(
        &self,
        dir: &Path,
        manifest: &Manifest,
        target: &str,
    ) -> Result<RemapTarget> {
        self.resolve_remap_specifier(dir, target)?
            .map(RemapTarget::Path)
            .ok_or_else(|| self.unresolved(manifest, target, RemapRole::Target))
    }

    /// Resolve a remap key or value without applying remaps.
    ///
    /// Declarations often name a sibling file without `./`, so a non-dotted
    /// specifier is tried as relative first and as a package name second.
    fn resolve_remap_specifier(&self, dir: &Path, spec: &str) -> Result<Option<PathBuf>> {
        if spec.starts_with('.') {
            return self.resolve_raw(dir, spec, &mut None);
        }

        match self.resolve_raw(dir, &format!("./{spec}"), &mut None) {
            Ok(Some(found)) => return Ok(Some(found)),
            // a sibling directory without a main file is not the file meant
            Ok(None) | Err(Error::MainNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        self.resolve_raw(dir, spec, &mut None)
    }

    fn unresolved(&self, manifest: &Manifest, specifier: &str, role: RemapRole) -> Error {
        Error::UnresolvedRemap {
            field: self.config().remap_field.clone(),
            manifest: manifest.path().to_path_buf(),
            specifier: specifier.to_string(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn resolver(mem: MemoryFileSystem) -> Resolver {
        Resolver::builder().file_system(mem).build()
    }

    fn path_target(p: &str) -> RemapTarget {
        RemapTarget::Path(PathBuf::from(p))
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut near: RemapTable = [(PathBuf::from("/x.js"), path_target("/z.js"))]
            .into_iter()
            .collect();
        let far: RemapTable = [
            (PathBuf::from("/x.js"), path_target("/y.js")),
            (PathBuf::from("/w.js"), RemapTarget::Empty),
        ]
        .into_iter()
        .collect();

        near.fill_missing(&far);
        assert_eq!(near.get(Path::new("/x.js")), Some(&path_target("/z.js")));
        assert_eq!(near.get(Path::new("/w.js")), Some(&RemapTarget::Empty));
    }

    #[test]
    fn test_overlay_replaces() {
        let mut base: RemapTable = [(PathBuf::from("/x.js"), path_target("/y.js"))]
            .into_iter()
            .collect();
        let overrides: RemapTable = [(PathBuf::from("/x.js"), RemapTarget::Empty)]
            .into_iter()
            .collect();

        base.overlay(&overrides);
        assert_eq!(base.get(Path::new("/x.js")), Some(&RemapTarget::Empty));
    }

    #[test]
    fn test_object_declaration() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file(
                    "/proj/package.json",
                    r#"{"browser": {"./server.js": "./client.js", "ws": false}}"#,
                )
                .with_file("/proj/server.js", "")
                .with_file("/proj/client.js", "")
                .with_file("/proj/node_modules/ws/package.json", r#"{"main": "lib/ws.js"}"#)
                .with_file("/proj/node_modules/ws/lib/ws.js", ""),
        );

        let table = r.load_remap_table(Path::new("/proj")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(Path::new("/proj/server.js")),
            Some(&path_target("/proj/client.js"))
        );
        assert_eq!(
            table.get(Path::new("/proj/node_modules/ws/lib/ws.js")),
            Some(&RemapTarget::Empty)
        );
    }

    #[test]
    fn test_key_without_dot_prefers_sibling_file() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/package.json", r#"{"browser": {"util": "shim"}}"#)
                .with_file("/proj/util.js", "")
                .with_file("/proj/shim.js", "")
                .with_file("/proj/node_modules/util/index.js", ""),
        );

        let table = r.load_remap_table(Path::new("/proj")).unwrap();
        assert_eq!(
            table.get(Path::new("/proj/util.js")),
            Some(&path_target("/proj/shim.js"))
        );
        assert!(!table.contains(Path::new("/proj/node_modules/util/index.js")));
    }

    #[test]
    fn test_key_falls_back_past_sibling_directory_without_main() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/package.json", r#"{"browser": {"events": "./ev-shim.js"}}"#)
                .with_dir("/proj/events/handlers")
                .with_file("/proj/ev-shim.js", "")
                .with_file("/proj/app.js", "")
                .with_file("/proj/node_modules/events/index.js", ""),
        );

        let table = r.load_remap_table(Path::new("/proj")).unwrap();
        assert_eq!(
            table.get(Path::new("/proj/node_modules/events/index.js")),
            Some(&path_target("/proj/ev-shim.js"))
        );
        assert_eq!(
            r.resolve(Path::new("/proj"), "./app").unwrap(),
            crate::Resolution::Path(PathBuf::from("/proj/app.js"))
        );
    }

    #[test]
    fn test_builtin_key() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/package.json", r#"{"browser": {"fs": false}}"#)
                .with_dir("/proj/src"),
        );

        let table = r.load_remap_table(Path::new("/proj/src")).unwrap();
        assert_eq!(table.get(Path::new("fs")), Some(&RemapTarget::Empty));
    }

    #[test]
    fn test_closer_ancestor_wins() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/a/package.json", r#"{"browser": {"./x.js": "./y.js", "./w.js": false}}"#)
                .with_file("/a/b/package.json", r#"{"browser": {"../x.js": "../z.js"}}"#)
                .with_file("/a/x.js", "")
                .with_file("/a/y.js", "")
                .with_file("/a/z.js", "")
                .with_file("/a/w.js", ""),
        );

        let table = r.load_remap_table(Path::new("/a/b")).unwrap();
        assert_eq!(table.get(Path::new("/a/x.js")), Some(&path_target("/a/z.js")));
        assert_eq!(table.get(Path::new("/a/w.js")), Some(&RemapTarget::Empty));

        let outer = r.load_remap_table(Path::new("/a")).unwrap();
        assert_eq!(outer.get(Path::new("/a/x.js")), Some(&path_target("/a/y.js")));
    }

    #[test]
    fn test_string_declaration_remaps_main() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/pkg/package.json", r#"{"main": "./node.js", "browser": "./alt.js"}"#)
                .with_file("/pkg/node.js", "")
                .with_file("/pkg/alt.js", ""),
        );

        let table = r.load_remap_table(Path::new("/pkg")).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(Path::new("/pkg/node.js")),
            Some(&path_target("/pkg/alt.js"))
        );
    }

    #[test]
    fn test_string_declaration_without_main_is_fatal() {
        let r = resolver(
            MemoryFileSystem::new().with_file("/pkg/package.json", r#"{"browser": "./alt.js"}"#),
        );

        let err = r.load_remap_table(Path::new("/pkg")).unwrap_err();
        assert!(matches!(err, Error::UnresolvedMain { ref dir, .. } if dir == Path::new("/pkg")));
    }

    #[test]
    fn test_unresolved_source_is_fatal() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/package.json", r#"{"browser": {"./gone.js": false}}"#),
        );

        let err = r.load_remap_table(Path::new("/proj")).unwrap_err();
        match err {
            Error::UnresolvedRemap {
                manifest,
                specifier,
                role,
                ..
            } => {
                assert_eq!(manifest, PathBuf::from("/proj/package.json"));
                assert_eq!(specifier, "./gone.js");
                assert_eq!(role, RemapRole::Source);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unresolved_target_is_fatal() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/package.json", r#"{"browser": {"./a.js": "./gone.js"}}"#)
                .with_file("/proj/a.js", ""),
        );

        let err = r.load_remap_table(Path::new("/proj")).unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedRemap {
                role: RemapRole::Target,
                ..
            }
        ));
    }

    #[test]
    fn test_declarations_are_cached_per_directory() {
        let mem = Arc::new(
            MemoryFileSystem::new()
                .with_file("/a/package.json", r#"{"browser": {"./x.js": false}}"#)
                .with_file("/a/x.js", "")
                .with_dir("/a/b/c"),
        );
        let r = Resolver::builder().file_system(Arc::clone(&mem)).build();

        r.load_remap_table(Path::new("/a/b/c")).unwrap();
        let reads = mem.manifest_reads();
        r.load_remap_table(Path::new("/a/b")).unwrap();
        r.load_remap_table(Path::new("/a/b/c")).unwrap();
        assert_eq!(mem.manifest_reads(), reads);

        let stats = r.cache_stats();
        assert_eq!(stats.flattened.misses, 2);
        assert_eq!(stats.flattened.hits, 1);
    }
}
