//! Per-resolver caches.
//!
//! Populate-once, read-many. Nothing is ever invalidated; build a new
//! [`Resolver`](super::Resolver) to see filesystem changes.

use super::engine::Resolution;
use super::remap::RemapTable;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Map whose values are computed at most once per key.
///
/// Each key owns a slot lock, so concurrent first callers for the same key
/// wait for a single computation while other keys proceed. A failed
/// computation leaves the slot empty for the next caller.
pub(crate) struct OnceMap<K, V> {
    slots: RwLock<HashMap<K, Arc<Mutex<Option<V>>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Eq + Hash + Clone, V: Clone> OnceMap<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing it with `f` on first use.
    ///
    /// `f` must not re-enter this map with the same key.
    pub(crate) fn get_or_try_insert_with<E>(
        &self,
        key: K,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let slot = {
            let existing = self.slots.read().get(&key).cloned();
            match existing {
                Some(slot) => slot,
                None => Arc::clone(self.slots.write().entry(key).or_default()),
            }
        };

        let mut value = slot.lock();
        if let Some(v) = value.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(v.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = f()?;
        *value = Some(computed.clone());
        Ok(computed)
    }

    /// Look up without computing.
    #[cfg(test)]
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.read().get(key).cloned()?;
        let value = slot.lock().clone();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Store a value unless one is already present.
    pub(crate) fn insert(&self, key: K, value: V) {
        let slot = Arc::clone(self.slots.write().entry(key).or_default());
        let mut current = slot.lock();
        if current.is_none() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            *current = Some(value);
        }
    }

    pub(crate) fn stats(&self) -> CacheCounters {
        CacheCounters {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> std::fmt::Debug for OnceMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceMap")
            .field("len", &self.slots.read().len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

/// Key of the resolved-result cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ResolvedKey {
    pub dir: PathBuf,
    pub specifier: String,
}

/// The three caches owned by a resolver.
#[derive(Debug)]
pub(crate) struct ResolverCaches {
    /// Directory -> remaps its own manifest declares (`None`: declares nothing).
    pub declared: OnceMap<PathBuf, Option<Arc<RemapTable>>>,
    /// Starting directory -> flattened table.
    pub flattened: OnceMap<PathBuf, Arc<RemapTable>>,
    /// (starting directory, specifier) -> final result.
    pub resolved: OnceMap<ResolvedKey, Resolution>,
}

impl ResolverCaches {
    pub(crate) fn new() -> Self {
        Self {
            declared: OnceMap::new(),
            flattened: OnceMap::new(),
            resolved: OnceMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            declared: self.declared.stats(),
            flattened: self.flattened.stats(),
            resolved: self.resolved.stats(),
        }
    }
}

/// Hit/miss counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
}

/// Counters for every resolver cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Per-directory remap declarations.
    pub declared: CacheCounters,
    /// Flattened remap tables.
    pub flattened: CacheCounters,
    /// Final resolutions.
    pub resolved: CacheCounters,
}
