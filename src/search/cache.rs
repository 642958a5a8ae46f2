//! Bounded FIFO cache
//!
//! Used for both the JSONPath cache and the query result cache. When an
//! insert pushes the cache over capacity, the single oldest-inserted key is
//! evicted. Reads do not refresh a key's position, so a hot key can be
//! evicted while colder ones survive; this mirrors insertion-ordered map
//! eviction rather than LRU.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Insertion-ordered cache with a fixed capacity
#[derive(Debug)]
pub struct FifoCache<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
    evictions: u64,
}

impl<K, V> FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            evictions: 0,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or overwrite a value.
    ///
    /// Overwriting keeps the key's original insertion position.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(slot) = self.map.get_mut(&key) {
            *slot = value;
            return;
        }

        self.order.push_back(key.clone());
        self.map.insert(key, value);

        while self.map.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                    self.evictions += 1;
                }
                None => break,
            }
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of evictions since creation
    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}
