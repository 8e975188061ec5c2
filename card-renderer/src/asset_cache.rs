//! Decoded-asset cache for interactive surfaces.
//!
//! The editor resolves an image layer's storage reference to pixels
//! asynchronously; until the pixels land here the layer simply does not
//! paint. Export never reads this cache: it decodes fresh bytes so the
//! exported bitmap cannot be skewed by stale interactive state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::image::PixelData;

/// Entry in the asset cache.
#[derive(Debug)]
struct CacheEntry {
    /// The decoded pixels.
    data: PixelData,
    /// Last access time.
    last_accessed: Instant,
    /// Size in bytes.
    size_bytes: usize,
}

/// Configuration for the asset cache.
#[derive(Debug, Clone)]
pub struct AssetCacheConfig {
    /// Maximum cache size in bytes.
    pub max_size_bytes: usize,
    /// Maximum age before eviction (if not accessed).
    pub max_age: Duration,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 128 * 1024 * 1024, // 128 MB
            max_age: Duration::from_secs(300), // 5 minutes
            max_entries: 256,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

/// Decoded pixels keyed by stable storage reference.
///
/// Provides LRU-based eviction and size/age/entry limits.
pub struct AssetCache {
    entries: HashMap<String, CacheEntry>,
    config: AssetCacheConfig,
    current_size: usize,
    stats: CacheStats,
}

impl AssetCache {
    /// Create a cache with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AssetCacheConfig::default())
    }

    /// Create a cache with custom configuration.
    #[must_use]
    pub fn with_config(config: AssetCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
            stats: CacheStats::default(),
        }
    }

    /// Get decoded pixels for a storage reference.
    pub fn get(&mut self, src: &str) -> Option<&PixelData> {
        if let Some(entry) = self.entries.get_mut(src) {
            entry.last_accessed = Instant::now();
            self.stats.hits += 1;
            Some(&entry.data)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Insert decoded pixels for a storage reference.
    ///
    /// May trigger eviction if cache limits are exceeded.
    pub fn insert(&mut self, src: String, data: PixelData) {
        let size_bytes = data.data.len();

        if let Some(old) = self.entries.remove(&src) {
            self.current_size -= old.size_bytes;
        }

        self.evict_if_needed(size_bytes);

        self.current_size += size_bytes;
        self.entries.insert(
            src,
            CacheEntry {
                data,
                last_accessed: Instant::now(),
                size_bytes,
            },
        );
    }

    /// Remove a reference from the cache.
    pub fn remove(&mut self, src: &str) -> Option<PixelData> {
        if let Some(entry) = self.entries.remove(src) {
            self.current_size -= entry.size_bytes;
            Some(entry.data)
        } else {
            None
        }
    }

    /// Check whether a reference is cached.
    #[must_use]
    pub fn contains(&self, src: &str) -> bool {
        self.entries.contains_key(src)
    }

    /// Clear all cached assets.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Current number of cached assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cache size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Evict stale entries (call periodically from the UI loop).
    pub fn maintenance(&mut self) {
        self.evict_expired();
    }

    fn evict_if_needed(&mut self, needed_bytes: usize) {
        while self.current_size + needed_bytes > self.config.max_size_bytes
            && !self.entries.is_empty()
        {
            self.evict_lru();
        }

        while self.entries.len() >= self.config.max_entries && !self.entries.is_empty() {
            self.evict_lru();
        }

        self.evict_expired();
    }

    fn evict_lru(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest_key {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
            }
        }
    }

    fn evict_expired(&mut self) {
        let now = Instant::now();
        let max_age = self.config.max_age;

        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_accessed) > max_age)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired_keys {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
            }
        }
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}
