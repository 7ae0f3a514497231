//! Resolution engine.
//!
//! Supports:
//! - Relative specifiers (`./`, `../`, `.`)
//! - Absolute filesystem specifiers
//! - Bare specifiers with `node_modules` lookup, including scoped names and sub-paths
//! - Extension probing (`.js` fast path, then the configured set)
//! - Directory resolution (`package.json` main, then `index`)
//! - Runtime built-ins through a [`NativeResolver`]
//! - Platform remaps applied after raw resolution, cycle-safe

use super::cache::{CacheStats, ResolvedKey, ResolverCaches};
use super::remap::{RemapTable, RemapTarget};
use super::trace::{record, Provenance, ProvenanceStep};
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::fs::{CachingFileSystem, FileKind, FileSystem, RealFileSystem};
use crate::manifest::Manifest;
use crate::native::{NativeResolver, NodeBuiltins};
use crate::paths::{
    dotted_extension, is_absolute_specifier, join_normalized, module_search_paths, normalize,
    parse_bare_specifier, with_appended_extension,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Extension tried first when a specifier has none.
const JS_EXTENSION: &str = ".js";

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An absolute file path (or a built-in module name).
    Path(PathBuf),
    /// Remapped to nothing: serve an empty module.
    Empty,
    /// Nothing matched. Not an error.
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    #[must_use]
    pub fn is_empty_module(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<RemapTarget> for Resolution {
    fn from(target: RemapTarget) -> Self {
        match target {
            RemapTarget::Path(p) => Self::Path(p),
            RemapTarget::Empty => Self::Empty,
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Record a provenance trail.
    pub include_provenance: bool,
    /// Extra remaps that take precedence over the directory's table.
    pub remaps: Option<RemapTable>,
}

impl ResolveOptions {
    #[must_use]
    pub fn with_provenance(mut self) -> Self {
        self.include_provenance = true;
        self
    }

    #[must_use]
    pub fn with_remaps(mut self, remaps: RemapTable) -> Self {
        self.remaps = Some(remaps);
        self
    }
}

/// Result of [`Resolver::resolve_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOutput {
    pub resolution: Resolution,
    /// Present when requested in the options.
    pub provenance: Option<Provenance>,
}

/// Module resolver with its own filesystem handle and caches.
///
/// Cheap to share across threads; caches live as long as the resolver.
#[derive(Debug)]
pub struct Resolver {
    fs: Arc<dyn FileSystem>,
    native: Arc<dyn NativeResolver>,
    config: ResolverConfig,
    pub(super) caches: ResolverCaches,
}

/// Builder for [`Resolver`].
#[derive(Debug, Default)]
pub struct ResolverBuilder {
    fs: Option<Arc<dyn FileSystem>>,
    native: Option<Arc<dyn NativeResolver>>,
    config: ResolverConfig,
}

impl ResolverBuilder {
    /// Use this filesystem as-is (no extra memoization is added).
    #[must_use]
    pub fn file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Some(Arc::new(fs));
        self
    }

    #[must_use]
    pub fn native_resolver(mut self, native: impl NativeResolver + 'static) -> Self {
        self.native = Some(Arc::new(native));
        self
    }

    #[must_use]
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> Resolver {
        Resolver {
            fs: self
                .fs
                .unwrap_or_else(|| Arc::new(CachingFileSystem::new(RealFileSystem))),
            native: self.native.unwrap_or_else(|| Arc::new(NodeBuiltins)),
            config: self.config,
            caches: ResolverCaches::new(),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Resolver over the real filesystem (memoized) with Node built-ins.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Cache hit/miss counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.caches.stats()
    }

    /// Resolve `specifier` from `from_dir`, applying platform remaps.
    pub fn resolve(&self, from_dir: &Path, specifier: &str) -> Result<Resolution> {
        self.resolve_with(from_dir, specifier, &ResolveOptions::default())
            .map(|out| out.resolution)
    }

    /// Resolve with options (provenance, caller remaps).
    ///
    /// Results without caller remaps are cached per (directory, specifier).
    /// Requesting provenance recomputes so the trail is complete.
    pub fn resolve_with(
        &self,
        from_dir: &Path,
        specifier: &str,
        options: &ResolveOptions,
    ) -> Result<ResolveOutput> {
        let from_dir = self.absolute_dir(from_dir)?;
        let key = ResolvedKey {
            dir: from_dir.clone(),
            specifier: specifier.to_string(),
        };
        let cacheable = options.remaps.is_none();

        if cacheable && !options.include_provenance {
            return self
                .caches
                .resolved
                .get_or_try_insert_with(key, || {
                    self.resolve_uncached(&from_dir, specifier, None, &mut None)
                })
                .map(|resolution| ResolveOutput {
                    resolution,
                    provenance: None,
                });
        }

        let mut trail = options.include_provenance.then(Provenance::new);
        let resolution =
            self.resolve_uncached(&from_dir, specifier, options.remaps.as_ref(), &mut trail)?;
        if cacheable {
            self.caches.resolved.insert(key, resolution.clone());
        }

        Ok(ResolveOutput {
            resolution,
            provenance: trail,
        })
    }

    fn resolve_uncached(
        &self,
        from_dir: &Path,
        specifier: &str,
        overrides: Option<&RemapTable>,
        trail: &mut Option<Provenance>,
    ) -> Result<Resolution> {
        let table = self.load_remap_table(from_dir)?;

        let Some(raw) = self.resolve_raw(from_dir, specifier, trail)? else {
            debug!(from = %from_dir.display(), specifier, "Not found");
            return Ok(Resolution::NotFound);
        };

        self.apply_remaps(&table, overrides, raw, trail)
    }

    /// Follow remaps from `resolved` until a miss, an empty target, or a fixed point.
    ///
    /// Revisiting a path already in the chain is a [`Error::RemapCycle`].
    fn apply_remaps(
        &self,
        table: &RemapTable,
        overrides: Option<&RemapTable>,
        resolved: PathBuf,
        trail: &mut Option<Provenance>,
    ) -> Result<Resolution> {
        let mut current = resolved;
        let mut chain = vec![current.clone()];
        let mut seen: HashSet<PathBuf> = HashSet::new();
        seen.insert(current.clone());

        loop {
            let target = overrides
                .and_then(|o| o.get(&current))
                .or_else(|| table.get(&current));

            let next = match target {
                None => return Ok(Resolution::Path(current)),
                // self-mapping is a fixed point
                Some(RemapTarget::Path(next)) if *next == current => {
                    return Ok(Resolution::Path(current))
                }
                Some(target) => target.clone(),
            };

            trace!(from = %current.display(), to = ?next, "Remap");
            record(trail, || ProvenanceStep::Remap {
                from: current.clone(),
                to: next.clone(),
            });

            match next {
                RemapTarget::Empty => return Ok(Resolution::Empty),
                RemapTarget::Path(next) => {
                    chain.push(next.clone());
                    if !seen.insert(next.clone()) {
                        return Err(Error::RemapCycle { chain });
                    }
                    current = next;
                }
            }
        }
    }

    /// Resolve without applying remaps.
    pub(super) fn resolve_raw(
        &self,
        from_dir: &Path,
        spec: &str,
        trail: &mut Option<Provenance>,
    ) -> Result<Option<PathBuf>> {
        if spec.is_empty() {
            return Ok(None);
        }

        let found = if is_absolute_specifier(spec) {
            self.probe(&normalize(Path::new(spec)))?
        } else if spec.starts_with('.') {
            // relative specifiers never consult search paths
            self.probe(&join_normalized(from_dir, spec))?
        } else {
            match self.find_package(from_dir, spec, trail)? {
                PackageLookup::Resolved(path) => return Ok(path),
                PackageLookup::Directory(dir) => Some((dir, FileKind::Directory)),
            }
        };

        match found {
            None => Ok(None),
            Some((dir, FileKind::Directory)) => self.resolve_main(&dir, trail).map(Some),
            Some((file, _)) => Ok(Some(file)),
        }
    }

    fn find_package(
        &self,
        from_dir: &Path,
        spec: &str,
        trail: &mut Option<Provenance>,
    ) -> Result<PackageLookup> {
        let (package_name, sub_path) = parse_bare_specifier(spec);
        let search_paths = if spec.starts_with("node:") {
            Vec::new()
        } else {
            module_search_paths(from_dir, &self.config.modules_dir)
        };

        for search_path in search_paths {
            let package_dir = search_path.join(package_name);
            if !self.fs.stat(&package_dir)?.is_dir() {
                continue;
            }

            debug!(package = package_name, search_path = %search_path.display(), "Package found");
            record(trail, || ProvenanceStep::Installed {
                package_name: package_name.to_string(),
                search_path: search_path.clone(),
            });

            return match sub_path {
                Some(sub) => self
                    .resolve_raw(&package_dir, &format!("./{sub}"), trail)
                    .map(PackageLookup::Resolved),
                None => Ok(PackageLookup::Directory(package_dir)),
            };
        }

        let builtin = self.native.try_resolve_builtin(from_dir, spec);
        if builtin.is_some() {
            trace!(specifier = spec, "Resolved as built-in");
        }
        Ok(PackageLookup::Resolved(builtin))
    }

    /// Extension probing for a candidate path.
    fn probe(&self, candidate: &Path) -> Result<Option<(PathBuf, FileKind)>> {
        let kind = self.fs.stat(candidate)?;
        if kind.exists() {
            return Ok(Some((candidate.to_path_buf(), kind)));
        }

        let original_ext = dotted_extension(candidate);

        // Short circuit for the most common case where it is a JS file
        if original_ext.is_none() {
            let with_js = with_appended_extension(candidate, JS_EXTENSION);
            let kind = self.fs.stat(&with_js)?;
            if kind.exists() {
                return Ok(Some((with_js, kind)));
            }
        }

        for ext in &self.config.extensions {
            if *ext == self.config.native_extension
                || original_ext.as_deref() == Some(ext.as_str())
                || (original_ext.is_none() && ext == JS_EXTENSION)
            {
                continue;
            }

            let with_ext = with_appended_extension(candidate, ext);
            trace!(path = %with_ext.display(), "Probe");
            let kind = self.fs.stat(&with_ext)?;
            if kind.exists() {
                return Ok(Some((with_ext, kind)));
            }
        }

        Ok(None)
    }

    /// Main file of a directory; failure is fatal.
    fn resolve_main(&self, dir: &Path, trail: &mut Option<Provenance>) -> Result<PathBuf> {
        match self.try_resolve_main(dir, trail)? {
            Some(main) => Ok(main),
            None => {
                let main = self
                    .read_manifest(dir)?
                    .and_then(|m| m.main().map(str::to_string))
                    .unwrap_or_else(|| self.config.default_main.clone());
                Err(Error::MainNotFound {
                    dir: dir.to_path_buf(),
                    main,
                })
            }
        }
    }

    /// Main file of a directory: manifest `main`, falling back to `./index`.
    pub(super) fn try_resolve_main(
        &self,
        dir: &Path,
        trail: &mut Option<Provenance>,
    ) -> Result<Option<PathBuf>> {
        self.resolve_main_within(dir, &mut Vec::new(), trail)
    }

    /// `visiting` holds the directories whose main is being resolved further
    /// up the stack; a main leading back into one of them is a miss.
    fn resolve_main_within(
        &self,
        dir: &Path,
        visiting: &mut Vec<PathBuf>,
        trail: &mut Option<Provenance>,
    ) -> Result<Option<PathBuf>> {
        visiting.push(dir.to_path_buf());
        let found = self.main_candidates(dir, visiting, trail);
        visiting.pop();
        found
    }

    fn main_candidates(
        &self,
        dir: &Path,
        visiting: &mut Vec<PathBuf>,
        trail: &mut Option<Provenance>,
    ) -> Result<Option<PathBuf>> {
        let manifest = self.read_manifest(dir)?;
        let default_main = self.config.default_main.as_str();
        let declared = manifest.as_deref().and_then(Manifest::main);

        let mut candidates = vec![declared.unwrap_or(default_main)];
        if declared.is_some_and(|m| m != default_main) {
            candidates.push(default_main);
        }

        for main in candidates {
            let Some(resolved) = self.resolve_main_candidate(dir, main, visiting, trail)? else {
                continue;
            };
            record(trail, || ProvenanceStep::Main {
                dir: dir.to_path_buf(),
                main: resolved.clone(),
            });
            return Ok(Some(resolved));
        }

        Ok(None)
    }

    fn resolve_main_candidate(
        &self,
        dir: &Path,
        main: &str,
        visiting: &mut Vec<PathBuf>,
        trail: &mut Option<Provenance>,
    ) -> Result<Option<PathBuf>> {
        let candidate = join_normalized(dir, main);
        match self.probe(&candidate)? {
            None => Ok(None),
            // "main": "." or mains pointing at each other
            Some((path, FileKind::Directory)) if visiting.contains(&path) => {
                trace!(dir = %dir.display(), main, "Main leads back into a visited directory");
                Ok(None)
            }
            Some((path, FileKind::Directory)) => self.resolve_main_within(&path, visiting, trail),
            Some((path, _)) => Ok(Some(path)),
        }
    }

    /// Read `dir`'s manifest, honouring `strict_manifests`.
    pub(super) fn read_manifest(&self, dir: &Path) -> Result<Option<Arc<Manifest>>> {
        let path = dir.join(&self.config.manifest_name);
        match self.fs.read_manifest(&path) {
            Err(Error::ManifestParse { path, source }) if !self.config.strict_manifests => {
                warn!(path = %path.display(), error = %source, "Ignoring malformed manifest");
                Ok(None)
            }
            other => other,
        }
    }

    /// Make `dir` absolute (against the process cwd) and normalized.
    pub(super) fn absolute_dir(&self, dir: &Path) -> Result<PathBuf> {
        if dir.is_absolute() {
            Ok(normalize(dir))
        } else {
            Ok(normalize(&std::env::current_dir()?.join(dir)))
        }
    }
}

enum PackageLookup {
    /// Final answer (sub-path or built-in), possibly not found.
    Resolved(Option<PathBuf>),
    /// Package directory; its main file is next.
    Directory(PathBuf),
}
