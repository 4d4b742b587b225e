use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    last_used: u64,
}

/// Bounded least-recently-used map.
///
/// The cache never drops entries on its own: `overflow` names the keys that
/// should go, and the owner evicts them so it can write each one back first.
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: HashMap<K, Slot<V>>,
    clock: u64,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Copy + Eq + Hash + Ord,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            clock: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Lookup that marks the entry as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_mut(key).map(|value| &*value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let stamp = self.tick();
        self.entries.get_mut(key).map(|slot| {
            slot.last_used = stamp;
            &mut slot.value
        })
    }

    /// Lookup without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let stamp = self.tick();
        self.entries
            .insert(
                key,
                Slot {
                    value,
                    last_used: stamp,
                },
            )
            .map(|slot| slot.value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|slot| slot.value)
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Vec<K> {
        let mut keys: Vec<K> = self.entries.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Keys to evict, least recently used first, so that the cache fits its
    /// capacity again. Pinned entries are skipped, so the result may leave the
    /// cache over capacity.
    pub fn overflow(&self, pinned: impl Fn(&K, &V) -> bool) -> Vec<K> {
        if self.entries.len() <= self.capacity {
            return Vec::new();
        }
        let excess = self.entries.len() - self.capacity;

        let mut candidates: Vec<(u64, K)> = self
            .entries
            .iter()
            .filter(|(key, slot)| !pinned(key, &slot.value))
            .map(|(key, slot)| (slot.last_used, *key))
            .collect();
        candidates.sort();
        candidates.into_iter().take(excess).map(|(_, key)| key).collect()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_names_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert(1u32, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert_eq!(cache.overflow(|_, _| false), vec![1]);

        cache.get(&1);
        assert_eq!(cache.overflow(|_, _| false), vec![2]);
    }

    #[test]
    fn peek_does_not_refresh() {
        let mut cache = LruCache::new(1);
        cache.insert(1u32, ());
        cache.insert(2, ());
        cache.peek(&1);
        assert_eq!(cache.overflow(|_, _| false), vec![1]);
    }

    #[test]
    fn pinned_entries_are_never_named() {
        let mut cache = LruCache::new(1);
        cache.insert(1u32, true);
        cache.insert(2, false);
        cache.insert(3, true);
        assert_eq!(cache.overflow(|_, pinned| *pinned), vec![2]);
    }

    #[test]
    fn within_capacity_means_nothing_to_evict() {
        let mut cache = LruCache::new(4);
        cache.insert(1u32, ());
        assert!(cache.overflow(|_, _| false).is_empty());
        assert_eq!(cache.remove(&1), Some(()));
        assert!(cache.is_empty());
    }
}
