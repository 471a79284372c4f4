//! In-memory TTL cache for computed metrics.
//!
//! Grounded on `original_source/.../metrics/cache.py`. The Python
//! version is deliberately thread-unsafe; this one wraps the same
//! dict-plus-monotonic-clock design in a mutex so it can live behind
//! an `Arc` shared across API handler tasks.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct MetricsCache<V> {
    ttl: Duration,
    store: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> MetricsCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock().expect("metrics cache mutex poisoned");
        match store.get(key) {
            Some((ts, value)) if ts.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                store.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key` with the current timestamp.
    pub fn set(&self, key: &str, value: V) {
        let mut store = self.store.lock().expect("metrics cache mutex poisoned");
        store.insert(key.to_string(), (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &str) {
        self.store.lock().expect("metrics cache mutex poisoned").remove(key);
    }

    pub fn clear(&self) {
        self.store.lock().expect("metrics cache mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let cache: MetricsCache<u32> = MetricsCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("a"), None);
        cache.set("a", 42);
        assert_eq!(cache.get("a"), Some(42));
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache: MetricsCache<u32> = MetricsCache::new(Duration::from_millis(0));
        cache.set("a", 1);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn invalidate_removes_single_key() {
        let cache: MetricsCache<u32> = MetricsCache::new(Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn clear_drops_every_entry() {
        let cache: MetricsCache<u32> = MetricsCache::new(Duration::from_secs(60));
        cache.set("a", 1);
        cache.clear();
        assert_eq!(cache.get("a"), None);
    }
}
