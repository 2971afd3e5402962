//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;

new_key_type! {
    /// Stable identity of a simulation object
    pub struct ObjectId;
}

/// Reference counts keyed by handle, dropping entries that reach zero
#[derive(Debug, Clone)]
pub struct RefCounts<K: std::hash::Hash + Eq + Copy> {
    counts: std::collections::HashMap<K, u32>,
}

impl<K: std::hash::Hash + Eq + Copy> RefCounts<K> {
    /// Create an empty counter set
    pub fn new() -> Self {
        Self { counts: std::collections::HashMap::new() }
    }

    /// Increment the count for `key`, returning the new value
    pub fn acquire(&mut self, key: K) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrement the count for `key`, returning the new value
    ///
    /// Releasing an untracked key is a no-op that returns 0.
    pub fn release(&mut self, key: K) -> u32 {
        match self.counts.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                self.counts.remove(&key);
                0
            }
            None => 0,
        }
    }

    /// Current count for `key`
    pub fn get(&self, key: K) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Number of keys with a non-zero count
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether every count is zero
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K: std::hash::Hash + Eq + Copy> Default for RefCounts<K> {
    fn default() -> Self {
        Self::new()
    }
}
