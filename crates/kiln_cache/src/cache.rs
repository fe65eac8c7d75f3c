//! The in-memory shader cache.

use std::collections::HashMap;
use std::sync::Arc;

use kiln_include::IncludeFinder;
use parking_lot::RwLock;

use crate::entry::{CacheEntry, CacheKey, CompiledShader};

/// A multi-map from [`CacheKey`] to compiled shaders.
///
/// Several entries may share a key; they differ in the include contents they
/// were compiled against. [`ShaderCache::find`] serves the first entry, in
/// insertion order, whose dependencies still resolve to identical text.
///
/// Lookups and inserts take `&self` and may run concurrently. Entries are
/// never modified or evicted; only [`ShaderCache::clear`] removes them.
#[derive(Default)]
pub struct ShaderCache {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Every entry, in insertion order.
    entries: Vec<Arc<CacheEntry>>,
    /// Key fingerprint to positions in `entries`, ascending.
    buckets: HashMap<u128, Vec<usize>>,
}

impl ShaderCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a compiled shader for `key`.
    ///
    /// Each candidate's dependencies are re-resolved through `finder` with the
    /// recorded include kind, requesting directory and identifier. The first
    /// candidate whose every dependency matches in hash and contents is
    /// returned. An entry without dependencies always matches.
    pub fn find(&self, key: &CacheKey, finder: &IncludeFinder) -> Option<Arc<CompiledShader>> {
        let candidates = self.candidates(key);
        let count = candidates.len();

        let hit = candidates.into_iter().find(|entry| {
            entry
                .dependencies
                .iter()
                .all(|dependency| dependency.is_unchanged(finder))
        });

        match hit {
            Some(entry) => {
                tracing::debug!(source = %key.source_identifier, "shader cache hit");
                Some(Arc::clone(&entry.value))
            }
            None => {
                tracing::debug!(
                    source = %key.source_identifier,
                    candidates = count,
                    "shader cache miss"
                );
                None
            }
        }
    }

    /// Clones the bucket for `key` out from under the lock.
    fn candidates(&self, key: &CacheKey) -> Vec<Arc<CacheEntry>> {
        let inner = self.inner.read();
        inner
            .buckets
            .get(&key.fingerprint())
            .into_iter()
            .flatten()
            .map(|&at| &inner.entries[at])
            .filter(|entry| entry.key == *key)
            .cloned()
            .collect()
    }

    /// Appends an entry to its key's bucket. Equal entries are not merged.
    pub fn insert(&self, entry: CacheEntry) {
        let fingerprint = entry.key.fingerprint();
        let mut inner = self.inner.write();
        let at = inner.entries.len();
        inner.entries.push(Arc::new(entry));
        inner.buckets.entry(fingerprint).or_default().push(at);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Number of distinct key fingerprints.
    pub fn bucket_count(&self) -> usize {
        self.inner.read().buckets.len()
    }

    /// Snapshot of every entry in insertion order.
    pub fn entries(&self) -> Vec<Arc<CacheEntry>> {
        self.inner.read().entries.clone()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.buckets.clear();
    }
}

impl std::fmt::Debug for ShaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ShaderCache")
            .field("entries", &inner.entries.len())
            .field("buckets", &inner.buckets.len())
            .finish()
    }
}

impl FromIterator<CacheEntry> for ShaderCache {
    fn from_iter<I: IntoIterator<Item = CacheEntry>>(iter: I) -> Self {
        let cache = Self::new();
        for entry in iter {
            cache.insert(entry);
        }
        cache
    }
}
