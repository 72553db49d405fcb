//! Sharded per-key lock table

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

/// Default number of shards per component
pub const DEFAULT_SHARDS: usize = 64;

/// Serializes read-modify-write cycles on the same row key.
///
/// Keys are hashed onto a fixed set of mutexes. Two different keys may share a
/// shard and wait on each other briefly; the same key always maps to the same
/// shard, so its mutations never interleave.
pub struct KeyLocks {
    shards: Vec<Mutex<()>>,
}

impl KeyLocks {
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Hold the lock for `key` until the guard is dropped
    pub fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        // The guarded value is (), so a poisoned shard carries no broken state.
        self.shards[self.shard_of(key)]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn shard_of(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}
