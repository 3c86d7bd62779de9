use std::collections::HashMap;
use std::fmt;

/// Logical handle returned by the scheduler.
///
/// Stable for the lifetime of a scheduled interval, unlike the host handle it maps to, which is
/// replaced on every re-arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(u64);

impl IntervalId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps each logical handle to the single host timer currently armed for it.
#[derive(Debug)]
pub struct Registry<H> {
    entries: HashMap<IntervalId, H>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H: Copy> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `handle` with `id`, returning the handle it replaces.
    pub fn insert(&mut self, id: IntervalId, handle: H) -> Option<H> {
        self.entries.insert(id, handle)
    }

    pub fn get(&self, id: IntervalId) -> Option<H> {
        self.entries.get(&id).copied()
    }

    pub fn remove(&mut self, id: IntervalId) -> Option<H> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: IntervalId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn drain(&mut self) -> Vec<(IntervalId, H)> {
        self.entries.drain().collect()
    }
}
