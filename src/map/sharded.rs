//! Sharded map implementation.

use super::hash::fnv32_display;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Shard count used when the caller asks for zero shards.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// Map configuration.
#[derive(Clone, Debug)]
pub struct ShardedMapConfig {
    /// Number of shards. Zero is normalized to [`DEFAULT_SHARD_COUNT`].
    pub shard_count: usize,
}

impl Default for ShardedMapConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

/// One independently locked partition.
struct Shard<K, V> {
    items: RwLock<HashMap<K, V>>,
}

impl<K, V> Shard<K, V> {
    fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

/// A hash map split into a fixed number of independently locked shards.
///
/// A key's shard is `fnv32(key.to_string()) % shard_count`. Lookups accept
/// any borrowed form of the key (`&str` for `String` keys); the borrowed
/// form must print the same `Display` text as the owned key. Single-key
/// operations lock one shard. Whole-map operations (`len`, `clear`, `keys`,
/// `values`, `range`) visit shards one at a time and never hold two shard
/// locks at once, so their results are not an atomic snapshot when writers
/// run concurrently.
pub struct ShardedMap<K, V> {
    /// Shards, created eagerly. Length never changes.
    shards: Vec<Shard<K, V>>,
}

impl<K, V> ShardedMap<K, V>
where
    K: Eq + Hash + Display,
{
    /// Create a map with `shard_count` shards (0 means 32).
    pub fn new(shard_count: usize) -> Self {
        Self::with_config(ShardedMapConfig { shard_count })
    }

    /// Create a map from a config.
    pub fn with_config(config: ShardedMapConfig) -> Self {
        let shard_count = if config.shard_count == 0 {
            DEFAULT_SHARD_COUNT
        } else {
            config.shard_count
        };

        tracing::trace!(shard_count, "creating sharded map");

        Self {
            shards: (0..shard_count).map(|_| Shard::new()).collect(),
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`.
    pub fn shard_index<Q>(&self, key: &Q) -> usize
    where
        Q: Display + ?Sized,
    {
        (fnv32_display(key) as usize) % self.shards.len()
    }

    fn shard_for<Q>(&self, key: &Q) -> &Shard<K, V>
    where
        Q: Display + ?Sized,
    {
        &self.shards[self.shard_index(key)]
    }

    /// Insert or overwrite a value.
    pub fn set(&self, key: K, value: V) {
        self.shard_for(&key).items.write().insert(key, value);
    }

    /// Get a copy of the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
        V: Clone,
    {
        self.shard_for(key).items.read().get(key).cloned()
    }

    /// Check whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        self.shard_for(key).items.read().contains_key(key)
    }

    /// Remove `key`, returning its value if it was present.
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        self.shard_for(key).items.write().remove(key)
    }

    /// Total number of entries, summed shard by shard.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.items.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.items.read().is_empty())
    }

    /// Entry count of each shard, in shard order.
    pub fn shard_lens(&self) -> Vec<usize> {
        self.shards.iter().map(|s| s.items.read().len()).collect()
    }

    /// Remove every entry, one shard at a time.
    pub fn clear(&self) {
        for shard in &self.shards {
            *shard.items.write() = HashMap::new();
        }
    }

    /// All keys, collected shard by shard.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.len());
        for shard in &self.shards {
            keys.extend(shard.items.read().keys().cloned());
        }
        keys
    }

    /// All values, collected shard by shard.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let mut values = Vec::with_capacity(self.len());
        for shard in &self.shards {
            values.extend(shard.items.read().values().cloned());
        }
        values
    }

    /// Call `f` for each entry until it returns `false`.
    ///
    /// Each shard's read lock is held only while that shard is visited.
    /// `f` must not call back into this map at all. Shard locks are not
    /// reentrant: a write to the visited shard deadlocks at once, and a
    /// read of it deadlocks as soon as a writer is queued on that shard.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for shard in &self.shards {
            let items = shard.items.read();
            for (k, v) in items.iter() {
                if !f(k, v) {
                    return;
                }
            }
        }
    }

    /// Return the existing value and `true`, or insert `value` and return it
    /// with `false`.
    pub fn get_or_set(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        let mut items = self.shard_for(&key).items.write();
        if let Some(existing) = items.get(&key) {
            return (existing.clone(), true);
        }
        items.insert(key, value.clone());
        (value, false)
    }

    /// Insert only if `key` is absent. Returns `true` if inserted.
    pub fn set_if_absent(&self, key: K, value: V) -> bool {
        let mut items = self.shard_for(&key).items.write();
        if items.contains_key(&key) {
            return false;
        }
        items.insert(key, value);
        true
    }

    /// Mutate the value for `key` in place under the shard's write lock.
    ///
    /// Returns `false` if the key was absent.
    pub fn update<Q, F>(&self, key: &Q, f: F) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
        F: FnOnce(&mut V),
    {
        match self.shard_for(key).items.write().get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: Eq + Hash + Display,
{
    fn default() -> Self {
        Self::with_config(ShardedMapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shards_normalized() {
        let map: ShardedMap<String, i32> = ShardedMap::new(0);
        assert_eq!(map.shard_count(), DEFAULT_SHARD_COUNT);

        let map: ShardedMap<String, i32> = ShardedMap::default();
        assert_eq!(map.shard_count(), 32);
    }

    #[test]
    fn test_shard_index_is_fnv() {
        let map: ShardedMap<&str, i32> = ShardedMap::new(4);
        assert_eq!(map.shard_index("a"), 2);
        assert_eq!(map.shard_index("b"), 1);
        assert_eq!(map.shard_index("c"), 0);
        assert_eq!(map.shard_index("d"), 3);

        let map: ShardedMap<u64, i32> = ShardedMap::new(4);
        assert_eq!(map.shard_index(&42u64), map.shard_index("42"));
    }

    #[test]
    fn test_set_get_delete() {
        let map = ShardedMap::new(4);
        map.set("a", 1);
        map.set("b", 2);

        assert_eq!(map.get(&"a"), Some(1));
        assert_eq!(map.delete(&"a"), Some(1));
        assert_eq!(map.get(&"a"), None);
        assert_eq!(map.delete(&"a"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let map = ShardedMap::new(8);
        map.set("k", 1);
        map.set("k", 2);
        assert_eq!(map.get(&"k"), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_shard_lens_follow_placement() {
        let map = ShardedMap::new(4);
        for key in ["a", "b", "c", "d", "e"] {
            map.set(key, ());
        }
        // "a" and "e" share shard 2.
        assert_eq!(map.shard_lens(), vec![1, 1, 2, 1]);
    }

    #[test]
    fn test_clear() {
        let map = ShardedMap::new(4);
        for i in 0..100 {
            map.set(i, i);
        }
        assert!(!map.is_empty());
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_keys_and_values() {
        let map = ShardedMap::new(3);
        for i in 0..10u32 {
            map.set(i, i * 10);
        }

        let mut keys = map.keys();
        keys.sort();
        assert_eq!(keys, (0..10).collect::<Vec<_>>());

        let mut values = map.values();
        values.sort();
        assert_eq!(values, (0..10).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_range_stops_early() {
        let map = ShardedMap::new(4);
        for i in 0..20 {
            map.set(i, i);
        }

        let mut visited = 0;
        map.range(|_, _| {
            visited += 1;
            visited < 5
        });
        assert_eq!(visited, 5);

        let mut sum = 0;
        map.range(|_, v| {
            sum += v;
            true
        });
        assert_eq!(sum, (0..20).sum::<i32>());
    }

    #[test]
    fn test_get_or_set_first_wins() {
        let map = ShardedMap::new(4);
        assert_eq!(map.get_or_set("k", 1), (1, false));
        assert_eq!(map.get_or_set("k", 2), (1, true));
        assert_eq!(map.get(&"k"), Some(1));
    }

    #[test]
    fn test_set_if_absent() {
        let map = ShardedMap::new(4);
        assert!(map.set_if_absent("k", 1));
        assert!(!map.set_if_absent("k", 2));
        assert_eq!(map.get(&"k"), Some(1));
    }

    #[test]
    fn test_update_in_place() {
        let map = ShardedMap::new(4);
        map.set("counter", 1);
        assert!(map.update(&"counter", |v| *v += 41));
        assert_eq!(map.get(&"counter"), Some(42));
        assert!(!map.update(&"missing", |v| *v += 1));
        assert!(!map.contains_key(&"missing"));
    }

    #[test]
    fn test_string_keys_borrowed_lookup() {
        let map: ShardedMap<String, i32> = ShardedMap::new(4);
        map.set("alice".to_string(), 1);
        map.set("bob".to_string(), 2);

        assert_eq!(map.shard_index("alice"), map.shard_index(&"alice".to_string()));
        assert_eq!(map.get("alice"), Some(1));
        assert!(map.contains_key("bob"));
        assert!(map.update("bob", |v| *v *= 10));
        assert_eq!(map.get("bob"), Some(20));
        assert_eq!(map.delete("alice"), Some(1));
        assert_eq!(map.get("alice"), None);
        assert_eq!(map.len(), 1);
    }
}
