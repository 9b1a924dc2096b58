//! Frame-scoped LOD buckets.
//!
//! A bucket is a fixed-capacity array plus an atomic insertion counter -
//! the CPU mirror of the GPU append buffer the WGSL kernel writes through
//! `atomicAdd`. Contents never persist across frames: the counter is reset
//! at the start of every dispatch and the bucket is refilled entirely
//! within it. Insertion order is unspecified and must not be relied upon.

use std::sync::atomic::{AtomicU32, Ordering};

use sward_shared::BladeInstance;

/// One LOD tier's survivor collection.
pub struct TierBucket {
    records: Box<[BladeInstance]>,
    count: AtomicU32,
}

impl TierBucket {
    /// Allocates a bucket with the given fixed capacity.
    ///
    /// # Panics
    ///
    /// Panics on zero capacity; buckets are sized once at configuration
    /// time and a zero-capacity tier is a programming error.
    #[must_use]
    pub fn with_capacity(capacity: u32) -> Self {
        assert!(capacity > 0, "bucket capacity must be non-zero");
        Self {
            records: vec![BladeInstance::default(); capacity as usize].into_boxed_slice(),
            count: AtomicU32::new(0),
        }
    }

    /// Fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.records.len() as u32
    }

    /// Resets the insertion counter. Called at the start of every dispatch;
    /// stale records past the new counter are never read.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }

    /// Appends a record, returning its insertion index.
    ///
    /// Mirrors the GPU contract: the counter always advances, but a record
    /// past capacity is dropped. `len()` and the argument updater clamp, so
    /// an overflowing frame draws a full bucket rather than corrupting one.
    pub fn push(&mut self, record: BladeInstance) -> u32 {
        let index = self.count.fetch_add(1, Ordering::Relaxed);
        if let Some(slot) = self.records.get_mut(index as usize) {
            *slot = record;
        }
        index
    }

    /// Number of live records this dispatch (clamped to capacity).
    #[must_use]
    pub fn len(&self) -> u32 {
        self.count.load(Ordering::Acquire).min(self.capacity())
    }

    /// True if no record survived into this bucket.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw counter value, which may exceed capacity on an overflowing
    /// frame. The argument updater uses `len()` instead.
    #[must_use]
    pub fn raw_count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// The live records of this dispatch.
    #[must_use]
    pub fn as_slice(&self) -> &[BladeInstance] {
        &self.records[..self.len() as usize]
    }
}
