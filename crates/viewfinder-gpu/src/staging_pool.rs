//! Pool of mappable staging buffers for read-back.
//!
//! Avoids allocating a staging buffer per capture by keeping released
//! buffers keyed by byte size. A buffer is handed out to one read-back at a
//! time, so overlapping captures never share a mapping.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Anything with a byte size that can be pooled.
pub trait Pooled {
    fn byte_size(&self) -> u64;
}

impl Pooled for wgpu::Buffer {
    fn byte_size(&self) -> u64 {
        self.size()
    }
}

impl<T: Pooled> Pooled for Arc<T> {
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

/// Pool of reusable buffers.
pub struct StagingPool<T = Arc<wgpu::Buffer>> {
    /// Available (free) buffers, keyed by byte size.
    free: HashMap<u64, Vec<T>>,
    /// Total memory held by free buffers.
    total_memory: u64,
    /// Maximum memory budget for the pool.
    max_memory: u64,
}

/// A pool shared between the render thread and map callbacks.
pub type SharedStagingPool = Arc<Mutex<StagingPool>>;

impl<T: Pooled> StagingPool<T> {
    /// Create a new pool with the given memory budget.
    pub fn new(max_memory: u64) -> Self {
        Self {
            free: HashMap::new(),
            total_memory: 0,
            max_memory,
        }
    }

    /// Take a free buffer of exactly `size` bytes, if one is pooled.
    pub fn acquire(&mut self, size: u64) -> Option<T> {
        let buffers = self.free.get_mut(&size)?;
        let buffer = buffers.pop()?;
        if buffers.is_empty() {
            self.free.remove(&size);
        }
        self.total_memory -= size;
        Some(buffer)
    }

    /// Return a buffer for reuse.
    pub fn release(&mut self, buffer: T) {
        let size = buffer.byte_size();

        // Over budget: drop the buffer instead
        if self.total_memory + size > self.max_memory {
            return;
        }

        self.total_memory += size;
        self.free.entry(size).or_default().push(buffer);
    }

    /// Total memory held by free buffers.
    pub fn memory_usage(&self) -> u64 {
        self.total_memory
    }

    /// Number of free buffers.
    pub fn buffer_count(&self) -> usize {
        self.free.values().map(|v| v.len()).sum()
    }

    /// Drop every buffer of a size other than `keep`.
    ///
    /// Called when the viewport changes so stale sizes do not linger.
    pub fn retain_size(&mut self, keep: u64) {
        self.free.retain(|&size, _| size == keep);
        self.total_memory = self
            .free
            .iter()
            .map(|(size, v)| size * v.len() as u64)
            .sum();
    }

    /// Clear all pooled buffers.
    pub fn clear(&mut self) {
        self.free.clear();
        self.total_memory = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Fake(u64);

    impl Pooled for Fake {
        fn byte_size(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn released_buffer_is_reused_for_same_size() {
        let mut pool = StagingPool::new(1024);
        assert!(pool.acquire(256).is_none());
        pool.release(Fake(256));
        assert_eq!(pool.memory_usage(), 256);
        assert!(pool.acquire(512).is_none());
        assert_eq!(pool.acquire(256), Some(Fake(256)));
        assert_eq!(pool.memory_usage(), 0);
        assert_eq!(pool.buffer_count(), 0);
    }

    #[test]
    fn over_budget_release_drops_buffer() {
        let mut pool = StagingPool::new(300);
        pool.release(Fake(256));
        pool.release(Fake(256));
        assert_eq!(pool.buffer_count(), 1);
    }

    #[test]
    fn retain_size_evicts_stale_sizes() {
        let mut pool = StagingPool::new(4096);
        pool.release(Fake(256));
        pool.release(Fake(512));
        pool.release(Fake(512));
        pool.retain_size(512);
        assert_eq!(pool.buffer_count(), 2);
        assert_eq!(pool.memory_usage(), 1024);
        pool.clear();
        assert_eq!(pool.memory_usage(), 0);
    }
}
