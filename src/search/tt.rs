use cozy_chess::Move;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best: Option<Move>,
    pub bound: Bound,
}

pub const DEFAULT_CAPACITY: usize = 100_000;

/// Fingerprint-keyed search cache with a hard entry cap.
///
/// Entries for a key already present are overwritten. New keys are accepted
/// only while the table is below capacity; nothing is ever evicted, so a long
/// game can fill the table with stale positions until the next `clear`.
#[derive(Debug)]
pub struct Tt {
    entries: HashMap<u64, Entry>,
    capacity: usize,
}

impl Default for Tt {
    fn default() -> Self { Self::new() }
}

impl Tt {
    pub fn new() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: HashMap::new(), capacity: capacity.max(1) }
    }

    pub fn clear(&mut self) { self.entries.clear(); }

    pub fn get(&self, key: u64) -> Option<Entry> { self.entries.get(&key).copied() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn is_full(&self) -> bool { self.entries.len() >= self.capacity }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn set_capacity_entries(&mut self, cap: usize) {
        self.capacity = cap.max(1);
        if self.entries.len() > self.capacity { self.entries.clear(); }
    }

    pub fn set_capacity_mb(&mut self, mb: usize) {
        // ~64 bytes per entry including map overhead
        let entries = (mb.saturating_mul(1024) * 1024) / 64;
        self.set_capacity_entries(entries);
    }

    /// Returns false when the entry was dropped because the table is full.
    pub fn put(&mut self, e: Entry) -> bool {
        if let Some(slot) = self.entries.get_mut(&e.key) {
            *slot = e;
            return true;
        }
        if self.is_full() { return false; }
        self.entries.insert(e.key, e);
        true
    }
}
