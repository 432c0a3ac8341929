//! Bounded least-recently-used map backing the overview cache
//!
//! Entries carry the tick of their last access; a tick-ordered index makes
//! eviction of the oldest entry logarithmic instead of a full scan.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// LRU (Least Recently Used) map with a fixed maximum size
///
/// When the map is full, inserting a new key evicts the least recently
/// accessed entry.
#[derive(Debug, Clone)]
pub(crate) struct LruCache<K, V> {
    /// Maximum number of entries
    max_size: usize,
    /// Value and last-access tick per key
    entries: HashMap<K, (V, u64)>,
    /// Last-access tick -> key, oldest first
    access_order: BTreeMap<u64, K>,
    /// Current access counter
    access_counter: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a map holding at most `max_size` entries (at least one)
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            entries: HashMap::new(),
            access_order: BTreeMap::new(),
            access_counter: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.access_counter += 1;
        self.access_counter
    }

    /// Evict the least recently used entry
    fn evict_lru(&mut self) -> Option<K> {
        let (_, key) = self.access_order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }

    /// Insert or replace a value, marking it most recently used
    pub(crate) fn put(&mut self, key: K, value: V) {
        let tick = self.next_tick();
        if let Some((_, old_tick)) = self.entries.get(&key) {
            self.access_order.remove(old_tick);
        } else if self.entries.len() >= self.max_size {
            self.evict_lru();
        }
        self.access_order.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
    }

    /// Look up a value, marking it most recently used
    pub(crate) fn get(&mut self, key: &K) -> Option<&V> {
        let tick = self.next_tick();
        let (value, last) = self.entries.get_mut(key)?;
        self.access_order.remove(&*last);
        *last = tick;
        self.access_order.insert(tick, key.clone());
        Some(value)
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let (value, tick) = self.entries.remove(key)?;
        self.access_order.remove(&tick);
        Some(value)
    }

    /// Remove every entry for which `drop_entry` returns true
    pub(crate) fn remove_where(&mut self, mut drop_entry: impl FnMut(&K, &V) -> bool) -> usize {
        let doomed: Vec<K> = self
            .entries
            .iter()
            .filter(|&(key, (value, _))| drop_entry(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
        self.access_counter = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.max_size
    }
}
