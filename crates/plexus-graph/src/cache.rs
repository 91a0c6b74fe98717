//! Memoization of computed hashes and values.
//!
//! Two bounded LRU caches sit behind every graph:
//!
//! - the hash cache maps `(plug, context hash)` to the hash of a computed
//!   output, and is tied to the graph generation it was filled under;
//! - the value cache maps a computed hash and the type it was converted to
//!   onto the value it produced. Equal hashes imply equal source values, so
//!   entries never go stale.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use crate::TRACING_TARGET_CACHE;
use crate::hash::ContentHash;
use crate::id::PlugId;
use crate::value::{Value, ValueType};

/// Snapshot of cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Hashes currently cached.
    pub hash_entries: usize,
    /// Hash lookups that found a current entry.
    pub hash_hits: usize,
    /// Hash lookups that missed or found a stale entry.
    pub hash_misses: usize,
    /// Hashes dropped to stay within capacity.
    pub hash_evictions: usize,
    /// Values currently cached.
    pub value_entries: usize,
    /// Value lookups that found an entry.
    pub value_hits: usize,
    /// Value lookups that missed.
    pub value_misses: usize,
    /// Values dropped to stay within capacity.
    pub evictions: usize,
}

impl CacheStatistics {
    /// Ratio of value hits to value lookups.
    pub fn value_hit_ratio(&self) -> f32 {
        let total = self.value_hits + self.value_misses;
        if total == 0 {
            0.0
        } else {
            self.value_hits as f32 / total as f32
        }
    }
}

/// Least recently used map with hit, miss and eviction counters.
///
/// A capacity of zero disables the cache.
#[derive(Debug)]
struct Lru<K: Hash + Eq, V> {
    name: &'static str,
    entries: Option<Mutex<LruCache<K, V>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    evictions: AtomicUsize,
}

impl<K: Hash + Eq + Copy, V: Clone> Lru<K, V> {
    fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            entries: NonZeroUsize::new(capacity).map(|capacity| Mutex::new(LruCache::new(capacity))),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            evictions: AtomicUsize::new(0),
        }
    }

    fn get_if(&self, key: &K, keep: impl FnOnce(&V) -> bool) -> Option<V> {
        let value = self.entries.as_ref().and_then(|entries| {
            let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.get(key).filter(|value| keep(value)).cloned()
        });
        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    fn put(&self, key: K, value: V) {
        let Some(entries) = &self.entries else {
            return;
        };

        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((evicted, _)) = entries.push(key, value) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    target: TRACING_TARGET_CACHE,
                    cache = self.name,
                    capacity = entries.cap().get(),
                    "Evicted least recently used entry"
                );
            }
        }
    }

    fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }
}

#[derive(Debug)]
pub(crate) struct HashCache {
    entries: Lru<(PlugId, ContentHash), (u64, ContentHash)>,
}

impl HashCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Lru::new("hash", capacity),
        }
    }

    pub fn get(&self, plug: PlugId, context: ContentHash, generation: u64) -> Option<ContentHash> {
        self.entries
            .get_if(&(plug, context), |(filled, _)| *filled == generation)
            .map(|(_, hash)| hash)
    }

    pub fn insert(&self, plug: PlugId, context: ContentHash, generation: u64, hash: ContentHash) {
        self.entries.put((plug, context), (generation, hash));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[derive(Debug)]
pub(crate) struct ValueCache {
    entries: Lru<(ContentHash, ValueType), Value>,
}

impl ValueCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Lru::new("value", capacity),
        }
    }

    /// Returns the value computed for `hash` and converted to `value_type`.
    pub fn get(&self, hash: &ContentHash, value_type: ValueType) -> Option<Value> {
        self.entries.get_if(&(*hash, value_type), |_| true)
    }

    pub fn insert(&self, hash: ContentHash, value: Value) {
        self.entries.put((hash, value.value_type()), value);
    }
}

pub(crate) fn statistics(hashes: &HashCache, values: &ValueCache) -> CacheStatistics {
    CacheStatistics {
        hash_entries: hashes.entries.len(),
        hash_hits: hashes.entries.hits.load(Ordering::Relaxed),
        hash_misses: hashes.entries.misses.load(Ordering::Relaxed),
        hash_evictions: hashes.entries.evictions.load(Ordering::Relaxed),
        value_entries: values.entries.len(),
        value_hits: values.entries.hits.load(Ordering::Relaxed),
        value_misses: values.entries.misses.load(Ordering::Relaxed),
        evictions: values.entries.evictions.load(Ordering::Relaxed),
    }
}
