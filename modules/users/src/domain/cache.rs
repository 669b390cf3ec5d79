use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::contract::model::User;

/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Users by id. Filled on reads, refreshed with the persisted value after every
/// write, so a hit is never older than the last write made through this process.
pub struct UserCache {
    enabled: bool,
    capacity: usize,
    entries: DashMap<i64, User>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl UserCache {
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    pub fn get(&self, id: i64) -> Option<User> {
        if !self.enabled {
            return None;
        }
        match self.entries.get(&id) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Fill from a store read. A value older than the cached one is ignored,
    /// since a write may have landed while the read was in flight.
    /// Returns whether `user` is now the cached value.
    pub fn put(&self, user: &User) -> bool {
        if !self.admits(user.id) {
            return false;
        }
        match self.entries.entry(user.id) {
            Entry::Occupied(mut slot) => {
                if user.updated_at < slot.get().updated_at {
                    return false;
                }
                slot.insert(user.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
            }
        }
        true
    }

    /// Store the value a write just persisted, replacing whatever is cached.
    pub fn refresh(&self, user: &User) -> bool {
        if !self.admits(user.id) {
            return false;
        }
        self.entries.insert(user.id, user.clone());
        true
    }

    // Known ids are always admitted; new ids only while below capacity.
    // Checked before taking an entry lock: `len` locks every shard.
    fn admits(&self, id: i64) -> bool {
        self.enabled && (self.entries.contains_key(&id) || self.entries.len() < self.capacity)
    }

    pub fn invalidate(&self, id: i64) {
        self.entries.remove(&id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            entries: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
