use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tracing::debug;

// Cache entry with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub html: String,
    pub created_at: Instant,
}

// Create a cache key (hash of the raw comment text)
pub fn make_cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// Rendered comments by text hash
pub struct LinkifyCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl LinkifyCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.created_at.elapsed() < self.ttl {
            return Some(entry.html.clone());
        }
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: String, html: String) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_expired();
            if self.entries.len() >= self.capacity {
                debug!(capacity = self.capacity, "linkify cache full, not caching");
                return;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                html,
                created_at: Instant::now(),
            },
        );
    }

    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
