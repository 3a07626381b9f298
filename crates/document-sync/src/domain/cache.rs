//! # Document Cache (Name-Keyed LRU)
//!
//! Bounded recency cache of the last known posted document per name.
//!
//! ## Keying
//!
//! Entries are keyed by document name, which makes "latest" lookups and the
//! update idempotence guard a single probe. A transaction-id alias is kept in
//! the same lock so exact-transaction lookups (and the confirmation fast
//! path) resolve without a second store. An alias only hits while the named
//! entry still holds that exact transaction.
//!
//! ## Coherency
//!
//! - An entry is trustworthy only if it is posted and matches the requested
//!   version (see [`invariant_cache_trustworthy`]).
//! - A put never replaces a higher version of the same name.
//! - Capacity 0 disables caching: lookups miss, puts are no-ops.

use super::entities::Document;
use super::errors::TransactionId;
use super::invariants::invariant_cache_trustworthy;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::debug;

struct CacheState {
    /// `None` when caching is disabled.
    entries: Option<LruCache<String, Document>>,
    /// Transaction id → document name.
    by_transaction: HashMap<TransactionId, String>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn drop_alias(&mut self, evicted_name: &str, evicted: &Document) {
        let Some(tx) = evicted.transaction_id.as_ref() else {
            return;
        };
        if self.by_transaction.get(tx).map(String::as_str) == Some(evicted_name) {
            self.by_transaction.remove(tx);
        }
    }
}

/// Name-keyed LRU cache of posted documents.
pub struct DocumentCache {
    inner: Mutex<CacheState>,
    capacity: usize,
}

impl DocumentCache {
    /// Create a cache holding at most `capacity` documents (0 disables it).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheState {
                entries: NonZeroUsize::new(capacity).map(LruCache::new),
                by_transaction: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            capacity,
        }
    }

    /// Is caching disabled?
    pub fn is_disabled(&self) -> bool {
        self.capacity == 0
    }

    /// Latest cached document for `name`.
    pub fn get(&self, name: &str) -> Option<Document> {
        let mut state = self.inner.lock();
        let found = state
            .entries
            .as_mut()
            .and_then(|entries| entries.get(name).cloned());
        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Cached document whose current transaction is `transaction_id`.
    pub fn get_by_transaction_id(&self, transaction_id: &str) -> Option<Document> {
        let mut state = self.inner.lock();
        let state = &mut *state;
        let found = match (state.by_transaction.get(transaction_id), state.entries.as_mut()) {
            (Some(name), Some(entries)) => entries
                .get(name)
                .filter(|doc| doc.transaction_id.as_deref() == Some(transaction_id))
                .cloned(),
            _ => None,
        };
        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Insert or refresh the entry for `doc.name`.
    pub fn put(&self, doc: &Document) {
        let mut state = self.inner.lock();
        let state = &mut *state;
        let Some(entries) = state.entries.as_mut() else {
            return;
        };

        if let Some(existing) = entries.peek(&doc.name) {
            if existing.version > doc.version {
                debug!(
                    "[doc-sync] Keeping cached {} v{} over older v{}",
                    doc.name, existing.version, doc.version
                );
                return;
            }
        }

        let evicted = entries.push(doc.name.clone(), doc.clone());
        if let Some((name, old)) = evicted {
            if old.transaction_id != doc.transaction_id || name != doc.name {
                state.drop_alias(&name, &old);
            }
        }
        if let Some(tx) = &doc.transaction_id {
            state.by_transaction.insert(tx.clone(), doc.name.clone());
        }
    }

    /// Is the entry for `name` trustworthy (at `desired_version`, if given)?
    pub fn is_valid(&self, name: &str, desired_version: Option<u64>) -> bool {
        let state = self.inner.lock();
        let entry = state.entries.as_ref().and_then(|entries| entries.peek(name));
        invariant_cache_trustworthy(entry, desired_version)
    }

    /// Is there a trustworthy entry currently holding `transaction_id`?
    pub fn is_valid_transaction(&self, transaction_id: &str, desired_version: Option<u64>) -> bool {
        let state = self.inner.lock();
        let entry = match (state.by_transaction.get(transaction_id), state.entries.as_ref()) {
            (Some(name), Some(entries)) => entries
                .peek(name)
                .filter(|doc| doc.transaction_id.as_deref() == Some(transaction_id)),
            _ => None,
        };
        invariant_cache_trustworthy(entry, desired_version)
    }

    /// Evict the entry for `name`.
    pub fn remove(&self, name: &str) -> Option<Document> {
        let mut state = self.inner.lock();
        let removed = state.entries.as_mut().and_then(|entries| entries.pop(name));
        if let Some(doc) = &removed {
            state.drop_alias(name, doc);
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        if let Some(entries) = state.entries.as_mut() {
            entries.clear();
        }
        state.by_transaction.clear();
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.as_ref().map_or(0, LruCache::len)
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cache statistics for monitoring.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        CacheStats {
            entries: state.entries.as_ref().map_or(0, LruCache::len),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Documents currently cached.
    pub entries: usize,
    /// Configured capacity.
    pub capacity: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through.
    pub misses: u64,
}
