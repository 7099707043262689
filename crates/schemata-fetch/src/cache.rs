//! # Document Cache
//!
//! Thread-safe, cloneable key → document store shared by every registry.
//!
//! All operations are synchronous (`parking_lot::RwLock`, not
//! `tokio::sync`) because the lock is never held across an `.await`.
//! Entries optionally expire after a TTL; an expired entry reads as a miss
//! and is dropped on the next write to the same key or on [`purge_expired`].
//!
//! [`purge_expired`]: DocumentCache::purge_expired

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::source::Document;

#[derive(Debug, Clone)]
struct CacheEntry {
    document: Document,
    stored_at: Instant,
}

/// Shared document cache.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Option<Duration>,
    stats: CacheStats,
}

impl DocumentCache {
    /// Create an empty cache whose entries never expire.
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Create an empty cache with an optional time-to-live per entry.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            stats: CacheStats::default(),
        }
    }

    /// Look up a fresh document.
    pub fn get(&self, key: &str) -> Option<Document> {
        let guard = self.entries.read();
        match guard.get(key) {
            Some(entry) if self.is_fresh(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.document))
            }
            Some(_) => {
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a document, replacing any previous entry under `key`.
    pub fn put(&self, key: &str, document: Document) {
        let entry = CacheEntry {
            document,
            stored_at: Instant::now(),
        };
        self.entries.write().insert(key.to_string(), entry);
    }

    /// Remove an entry, returning the stored document if present.
    pub fn remove(&self, key: &str) -> Option<Document> {
        self.entries.write().remove(key).map(|e| e.document)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut guard = self.entries.write();
        let before = guard.len();
        guard.retain(|_, entry| self.is_fresh(entry));
        before - guard.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .map_or(true, |ttl| entry.stored_at.elapsed() < ttl)
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Lookup counters for a [`DocumentCache`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    expired: Arc<AtomicU64>,
}

impl CacheStats {
    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups for keys never stored.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Lookups that found only a stale entry.
    pub fn expired(&self) -> u64 {
        self.expired.load(Ordering::Relaxed)
    }
}
