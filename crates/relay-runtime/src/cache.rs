//! Dedup cache with LRU eviction and optional TTL.
//!
//! Each key maps to a `OnceCell` slot: the first caller initializes it by
//! running the tool, concurrent callers with the same key await the same
//! slot. Slots that are still in flight are never evicted, so at most one
//! execution per key runs at a time within a cache.
//! Uses a std `Mutex` since the lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tokio::time::Instant;

use relay_types::Outcome;

use crate::error::RuntimeError;
use crate::runtime_config::DedupPolicy;

/// Settled result shared by every caller of one deduplicated key.
pub type DedupResult = Result<Outcome, RuntimeError>;

/// One shared execution slot.
pub type DedupSlot = Arc<OnceCell<DedupResult>>;

/// Builds the dedup key for a tool and an input digest.
pub fn dedup_key(tool: &str, input_hash: &str) -> String {
    format!("{tool}:{input_hash}")
}

/// Thread-safe dedup cache, cheap to clone (clones share entries).
#[derive(Clone, Default)]
pub struct DedupCache {
    inner: Arc<Mutex<LruInner>>,
}

struct CacheEntry {
    slot: DedupSlot,
    /// Set once the executing caller has filled the slot; TTL counts from here.
    settled: Option<Instant>,
}

/// Internal LRU state: `order` front = least recently used.
#[derive(Default)]
struct LruInner {
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
}

impl DedupCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `key`, creating an empty one if absent.
    ///
    /// Expired completed entries are purged first; if the cache is at
    /// capacity the least recently used completed entry is evicted.
    pub fn acquire(&self, key: &str, policy: &DedupPolicy) -> DedupSlot {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ttl) = policy.ttl() {
            inner.purge_expired(ttl);
        }
        if let Some(slot) = inner.entries.get(key).map(|e| Arc::clone(&e.slot)) {
            inner.touch(key);
            return slot;
        }
        if inner.entries.len() >= policy.capacity {
            inner.evict_lru();
        }
        let slot: DedupSlot = Arc::new(OnceCell::new());
        inner.order.push(key.to_string());
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                slot: Arc::clone(&slot),
                settled: None,
            },
        );
        slot
    }

    /// Returns the settled result for `key`, if one is cached.
    pub fn peek(&self, key: &str) -> Option<DedupResult> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(key).and_then(|e| e.slot.get().cloned())
    }

    /// Starts the TTL clock for `key`, if it still holds `slot`.
    pub fn mark_settled(&self, key: &str, slot: &DedupSlot) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = inner.entries.get_mut(key) {
            if Arc::ptr_eq(&entry.slot, slot) && entry.settled.is_none() {
                entry.settled = Some(Instant::now());
            }
        }
    }

    /// Returns the number of cached slots (in flight or settled).
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache")
            .field("len", &self.len())
            .finish()
    }
}

impl LruInner {
    /// Moves `key` to the back (most recently used).
    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
    }

    /// Evicts the least recently used settled entry. In-flight slots stay.
    fn evict_lru(&mut self) {
        let victim = self
            .order
            .iter()
            .position(|k| self.entries.get(k).is_some_and(|e| e.slot.initialized()));
        if let Some(idx) = victim {
            let key = self.order.remove(idx);
            self.entries.remove(&key);
        }
    }

    /// Drops entries that settled more than `ttl` ago.
    fn purge_expired(&mut self, ttl: std::time::Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, e| !e.settled.is_some_and(|at| now.duration_since(at) >= ttl));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
    }
}
