use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use lru::LruCache;
use serde::Serialize;
use serde_json::{json, Value};

type SingleStorage = Arc<Mutex<LruCache<Value, Value>>>;
type GlobalStorage = Mutex<HashMap<String, SingleStorage>>;

lazy_static! {
    // #{cache_name => single_storage}
    //
    // We key by a caller-supplied name so independent stages (and tests) get
    // isolated storage without needing their own lazy_static.
    static ref GLOBAL_STORAGE: GlobalStorage = Mutex::new(HashMap::new());
}

/// Process-wide, in-memory memoization cache for a single stage's
/// idempotent lookups (e.g. geocoding a location string). Read-mostly,
/// best-effort: entries are lost on restart and nothing depends on them for
/// correctness, only for avoiding redundant outbound calls.
///
/// Keys and values round-trip through `serde_json::Value` so a single cache
/// type can serve any `(query, owner_context)` shape a stage wants to use as
/// a key.
pub struct MemoryCache {
    storage: SingleStorage,
}

impl MemoryCache {
    /// `name` isolates storage so unrelated stages (and parallel tests)
    /// never observe each other's entries. `capacity` bounds the LRU.
    pub fn new(name: impl Into<String>, capacity: NonZeroUsize) -> Self {
        let mut global = GLOBAL_STORAGE.lock().unwrap();
        let storage = global
            .entry(name.into())
            .or_insert_with(|| Arc::new(Mutex::new(LruCache::new(capacity))))
            .clone();
        Self { storage }
    }

    pub fn put<K: Serialize, V: Serialize>(&self, key: K, value: V) {
        let mut lock = self.storage.lock().unwrap();
        lock.put(json!(key), json!(value));
    }

    pub fn get<K: Serialize, V: serde::de::DeserializeOwned>(&self, key: &K) -> Option<V> {
        let mut lock = self.storage.lock().unwrap();
        lock.get(&json!(key))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove<K: Serialize>(&self, key: &K) -> bool {
        let mut lock = self.storage.lock().unwrap();
        lock.pop(&json!(key)).is_some()
    }

    pub fn len(&self) -> usize {
        self.storage.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache = MemoryCache::new("put_then_get_round_trips", NonZeroUsize::new(8).unwrap());
        cache.put("fukuoka", "33.59,130.40");
        let value: Option<String> = cache.get(&"fukuoka");
        assert_eq!(value.as_deref(), Some("33.59,130.40"));
    }

    #[test]
    fn distinct_names_do_not_share_storage() {
        let a = MemoryCache::new("distinct_a", NonZeroUsize::new(8).unwrap());
        let b = MemoryCache::new("distinct_b", NonZeroUsize::new(8).unwrap());
        a.put("key", "a-value");
        let from_b: Option<String> = b.get(&"key");
        assert!(from_b.is_none());
    }

    #[test]
    fn eviction_drops_the_least_recently_used_entry() {
        let cache = MemoryCache::new("eviction_drops_lru", NonZeroUsize::new(2).unwrap());
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.get::<_, i32>(&"a"), None);
        assert_eq!(cache.get::<_, i32>(&"b"), Some(2));
        assert_eq!(cache.get::<_, i32>(&"c"), Some(3));
    }

    #[test]
    fn remove_reports_whether_a_key_was_present() {
        let cache = MemoryCache::new("remove_reports_presence", NonZeroUsize::new(4).unwrap());
        cache.put("key", "value");
        assert!(cache.remove(&"key"));
        assert!(!cache.remove(&"key"));
    }
}
