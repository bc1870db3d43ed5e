use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Capacity bounds of the display spin box; callers clamp with these.
pub const MIN_CAPACITY: usize = 100;
pub const DEFAULT_CAPACITY: usize = 1000;
pub const MAX_CAPACITY: usize = 5000;

/// Bounded rolling store of the most recent samples.
///
/// Appends beyond the capacity evict from the front, so the store always
/// holds the newest `capacity` samples in arrival order.
#[derive(Debug)]
pub struct SampleHistory {
    samples: VecDeque<i32>,
    capacity: usize,
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SampleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(MAX_CAPACITY)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a decoded batch at the tail, evicting oldest samples first
    /// until the capacity invariant holds again.
    pub fn append(&mut self, batch: &[i32]) {
        self.samples.extend(batch.iter().copied());
        self.trim();
    }

    /// Change the ceiling; trims immediately if the store is now over it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    /// Owned copy of the stored samples, oldest first.
    pub fn snapshot(&self) -> Vec<i32> {
        self.samples.iter().copied().collect()
    }

    fn trim(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }
}

/// Cloneable handle sharing one [`SampleHistory`] between the receive
/// thread and any number of analysis readers. Each operation holds the lock
/// for a single append/evict or copy, so a reader sees either the pre- or
/// post-append state, never a torn one.
#[derive(Debug, Clone)]
pub struct SharedHistory(Arc<Mutex<SampleHistory>>);

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(SampleHistory::new(capacity))))
    }

    pub fn append(&self, batch: &[i32]) {
        self.lock().append(batch);
    }

    pub fn set_capacity(&self, capacity: usize) {
        self.lock().set_capacity(capacity);
    }

    pub fn snapshot(&self) -> Vec<i32> {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicked reader must not take the producer down with it, so a
    // poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, SampleHistory> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SharedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
