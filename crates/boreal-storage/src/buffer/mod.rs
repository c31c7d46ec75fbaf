//! Buffer pool manager for BorealDB.
//!
//! The buffer pool caches a fixed number of disk pages in memory frames:
//!
//! - **Page table**: an extendible hash table mapping `PageId -> FrameId`
//! - **Frame array**: `pool_size` fixed-size byte buffers with pin counts
//!   and dirty flags
//! - **Replacer**: the eviction policy (LRU-K by default, CLOCK optional)
//!   tracking which frames may be reclaimed
//! - **Free list**: frames that hold no page at all
//!
//! Every frame is in exactly one of three states: unused (free list),
//! pinned (in use, never evicted), or evictable (tracked by the replacer).
//! Dirty pages are written back before their frame is reused.
//!
//! A single latch serializes all pool operations, including the disk I/O
//! they perform; see [`BufferPoolManager`] for the locking discipline.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use boreal_storage::buffer::{BufferPoolConfig, BufferPoolManager};
//! use boreal_storage::disk::FileDiskManager;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BufferPoolConfig::new(64);
//! let disk = Arc::new(FileDiskManager::open("data.db", config.page_size)?);
//! let pool = BufferPoolManager::new(config, disk)?;
//!
//! let frame = pool.new_page()?;
//! let page_id = frame.page_id();
//! frame.write_data()[0..5].copy_from_slice(b"hello");
//! pool.unpin_page(page_id, true)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod eviction;
mod frame;
mod latch;
mod pool;

pub use config::{BufferPoolConfig, EvictionPolicy};
pub use error::{BufferError, BufferResult};
pub use eviction::{ClockReplacer, LruKReplacer, Replacer};
pub use frame::{BufferFrame, FrameId};
pub use latch::{PageReadGuard, PageWriteGuard};
pub use pool::BufferPoolManager;

/// Statistics for buffer pool monitoring.
#[derive(Debug, Clone, Default)]
pub struct BufferPoolStats {
    /// Total number of page fetches.
    pub fetches: u64,
    /// Number of fetches served from memory.
    pub hits: u64,
    /// Number of fetches that required a disk read.
    pub misses: u64,
    /// Number of pages evicted to make room.
    pub evictions: u64,
    /// Number of page write-backs (explicit flushes and dirty evictions).
    pub flushes: u64,
    /// Current number of pinned frames.
    pub pinned_frames: usize,
    /// Current number of dirty frames.
    pub dirty_frames: usize,
    /// Current number of frames on the free list.
    pub free_frames: usize,
}

impl BufferPoolStats {
    /// Returns the cache hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        if self.fetches == 0 {
            0.0
        } else {
            self.hits as f64 / self.fetches as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_hit_ratio() {
        let mut stats = BufferPoolStats::default();
        assert_eq!(stats.hit_ratio(), 0.0);

        stats.fetches = 10;
        stats.hits = 4;
        assert!((stats.hit_ratio() - 0.4).abs() < f64::EPSILON);
    }
}
