//! Upstream response cache
//!
//! Keeps fetched caption XML and video info for a while so repeated
//! requests for the same video don't hit the video site again.
//! Bounded by entry count; expired entries go first, then least recently used.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use crate::config::CacheConfig;

/// Cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Bytes,
    pub created_at: SystemTime,
    pub last_accessed: SystemTime,
}

impl CacheEntry {
    pub fn new(data: Bytes) -> Self {
        let now = SystemTime::now();
        Self {
            data,
            created_at: now,
            last_accessed: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = SystemTime::now();
    }

    pub fn age_secs(&self) -> u64 {
        self.created_at.elapsed().map(|d| d.as_secs()).unwrap_or(0)
    }

    pub fn is_expired(&self, ttl_secs: u64) -> bool {
        self.age_secs() >= ttl_secs
    }
}

/// TTL cache for upstream responses
pub struct ResponseCache {
    /// Cache entries (key -> entry)
    entries: DashMap<String, CacheEntry>,
    /// Bytes held by all entries
    memory_bytes: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            memory_bytes: AtomicUsize::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            config,
        }
    }

    /// Generate cache key from components
    pub fn make_key(kind: &str, video_id: &str, variant: &str) -> String {
        format!("{}:{}:{}", kind, video_id, variant)
    }

    /// Get a cached response. Expired entries are dropped on the way.
    pub fn get(&self, kind: &str, video_id: &str, variant: &str) -> Option<Bytes> {
        if !self.config.enabled {
            return None;
        }
        let key = Self::make_key(kind, video_id, variant);

        let found = match self.entries.get_mut(&key) {
            Some(mut entry) if !entry.is_expired(self.config.ttl_secs) => {
                entry.touch();
                Some(entry.data.clone())
            }
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match found {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            None => {
                self.remove_key(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Cache a response
    pub fn insert(&self, kind: &str, video_id: &str, variant: &str, data: Bytes) {
        if !self.config.enabled {
            return;
        }
        let key = Self::make_key(kind, video_id, variant);
        self.remove_key(&key);

        // Other handlers insert concurrently; read the length once.
        let len = self.entries.len();
        if len >= self.config.max_entries {
            self.evict((len + 1).saturating_sub(self.config.max_entries));
        }

        self.memory_bytes.fetch_add(data.len(), Ordering::Relaxed);
        if let Some(old) = self.entries.insert(key, CacheEntry::new(data)) {
            self.memory_bytes.fetch_sub(old.data.len(), Ordering::Relaxed);
        }
    }

    fn remove_key(&self, key: &str) {
        if let Some((_, entry)) = self.entries.remove(key) {
            self.memory_bytes
                .fetch_sub(entry.data.len(), Ordering::Relaxed);
        }
    }

    /// Make room for `needed` entries
    fn evict(&self, needed: usize) {
        let before = self.entries.len();
        self.clear_expired();
        let freed = before.saturating_sub(self.entries.len());
        if freed >= needed {
            return;
        }

        // Still full, remove by LRU
        let mut by_age: Vec<(String, SystemTime)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().last_accessed))
            .collect();
        by_age.sort_by_key(|(_, t)| *t);

        for (key, _) in by_age.into_iter().take(needed - freed) {
            self.remove_key(&key);
        }
    }

    /// Clear all expired entries
    pub fn clear_expired(&self) {
        let mut freed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired(self.config.ttl_secs) {
                freed += entry.data.len();
                false
            } else {
                true
            }
        });
        self.memory_bytes.fetch_sub(freed, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut oldest_age = 0;
        for entry in self.entries.iter() {
            oldest_age = oldest_age.max(entry.value().age_secs());
        }

        CacheStats {
            enabled: self.config.enabled,
            entry_count: self.entries.len(),
            max_entries: self.config.max_entries,
            total_size_bytes: self.memory_bytes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            oldest_entry_age_secs: oldest_age,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache statistics
#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entry_count: usize,
    pub max_entries: usize,
    pub total_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub oldest_entry_age_secs: u64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
