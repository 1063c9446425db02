// Fixed-capacity ring buffer of snapshots, owned by the producer task.
// Slots are preallocated once; head/len are advanced modulo capacity.

use crate::error::{Result, SamplerError};
use crate::models::Snapshot;

/// Default history: 600 ticks.
pub const DEFAULT_CAPACITY: usize = 600;

#[derive(Debug)]
pub struct SampleWindow {
    slots: Box<[Option<Snapshot>]>,
    /// Index of the oldest snapshot.
    head: usize,
    len: usize,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SampleWindow {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `snapshot`, evicting the oldest when full.
    /// Rejects (without mutating) a snapshot not strictly newer than the latest.
    pub fn push(&mut self, snapshot: Snapshot) -> Result<()> {
        if let Ok(latest) = self.latest() {
            let latest_ts = latest.timestamp();
            if snapshot.timestamp() <= latest_ts {
                let behind = latest_ts.duration_since(snapshot.timestamp());
                return Err(SamplerError::OutOfOrderSample {
                    behind_ms: u64::try_from(behind.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }

        let capacity = self.capacity();
        if self.len == capacity {
            self.slots[self.head] = None;
            self.head = (self.head + 1) % capacity;
            self.len -= 1;
        }
        let tail = (self.head + self.len) % capacity;
        self.slots[tail] = Some(snapshot);
        self.len += 1;
        Ok(())
    }

    pub fn oldest(&self) -> Result<&Snapshot> {
        self.get(0).ok_or(SamplerError::WindowEmpty)
    }

    pub fn latest(&self) -> Result<&Snapshot> {
        match self.len {
            0 => Err(SamplerError::WindowEmpty),
            n => self.get(n - 1).ok_or(SamplerError::WindowEmpty),
        }
    }

    /// Chronological iteration, oldest first. Reverse with `.rev()`.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Snapshot> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    fn get(&self, offset: usize) -> Option<&Snapshot> {
        if offset >= self.len {
            return None;
        }
        self.slots[(self.head + offset) % self.capacity()].as_ref()
    }
}
