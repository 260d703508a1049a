// Process-local TTL cache for semi-static datamall answers. Purely an
// optimization layer in front of the upstream and the external store, never a
// source of truth, and never shared across processes.

use dashmap::DashMap;
use std::time::Duration;
use std::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed TTL store. Expiry is checked on read and expired entries are evicted
/// lazily, there is no background sweep.
#[derive(Debug)]
pub struct ResultCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> ResultCache<V> {
        ResultCache {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }

        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        None
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> ResultCache<V> {
        ResultCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips_within_ttl() {
        let cache: ResultCache<String> = ResultCache::new();

        cache.set("busRoute", "payload".to_string(), Duration::from_secs(60));

        assert_eq!(cache.get("busRoute"), Some("payload".to_string()));
    }

    #[test]
    fn expired_entries_read_as_misses_and_are_evicted() {
        let cache: ResultCache<u32> = ResultCache::new();

        cache.set("stale", 7, Duration::from_secs(0));

        assert_eq!(cache.get("stale"), None);
        assert!(cache.is_empty(), "the expired entry must be evicted lazily");
    }

    #[test]
    fn overwriting_refreshes_the_expiry() {
        let cache: ResultCache<u32> = ResultCache::new();

        cache.set("key", 1, Duration::from_secs(0));
        cache.set("key", 2, Duration::from_secs(60));

        assert_eq!(cache.get("key"), Some(2));
    }

    #[test]
    fn delete_and_clear_remove_entries() {
        let cache: ResultCache<u32> = ResultCache::new();

        cache.set("a", 1, Duration::from_secs(60));
        cache.set("b", 2, Duration::from_secs(60));

        cache.delete("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }
}
