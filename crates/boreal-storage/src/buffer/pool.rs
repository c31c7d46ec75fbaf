//! Buffer pool manager.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use boreal_common::types::PageId;
use boreal_index::ExtendibleHashTable;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::config::{BufferPoolConfig, EvictionPolicy};
use super::error::{BufferError, BufferResult};
use super::eviction::{ClockReplacer, LruKReplacer, Replacer};
use super::frame::{BufferFrame, FrameId};
use super::latch::{PageReadGuard, PageWriteGuard};
use super::BufferPoolStats;
use crate::disk::DiskManager;
use crate::log::LogManager;

/// State guarded by the pool latch.
///
/// The page table and replacer carry latches of their own (they are usable
/// standalone), but within the pool every access goes through this outer
/// latch, which is always taken first.
struct PoolState {
    /// Maps resident page ids to their frames.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Frames that hold no page.
    free_list: VecDeque<FrameId>,
    /// Eviction policy over the non-free, unpinned frames.
    replacer: Box<dyn Replacer>,
    /// Next page id to hand out.
    next_page_id: u64,
}

/// The buffer pool manages page caching for the storage engine.
///
/// A fixed array of frames is shared by all callers. Pages are pinned
/// while in use and written back before their frame is reused. One latch
/// serializes every public operation, disk I/O included; the simplicity
/// buys determinism at the cost of throughput under contention.
///
/// Frames are handed out as `Arc<BufferFrame>`. A frame returned by
/// [`new_page`](Self::new_page) or [`fetch_page`](Self::fetch_page) is
/// pinned; the caller owes a matching [`unpin_page`](Self::unpin_page).
/// The guard variants ([`fetch_page_read`](Self::fetch_page_read) and
/// friends) repay that debt automatically on drop.
pub struct BufferPoolManager {
    config: BufferPoolConfig,
    /// The frame array; fixed for the pool's lifetime.
    frames: Vec<Arc<BufferFrame>>,
    latch: Mutex<PoolState>,
    disk: Arc<dyn DiskManager>,
    /// Held by identity only; no log protocol runs here.
    log_manager: Option<Arc<LogManager>>,
    fetch_count: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
    flush_count: AtomicU64,
}

impl BufferPoolManager {
    /// Creates a buffer pool over `disk` with the given configuration.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;

        let frames: Vec<Arc<BufferFrame>> = (0..config.pool_size)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i), config.page_size)))
            .collect();

        let replacer: Box<dyn Replacer> = match config.policy {
            EvictionPolicy::LruK => Box::new(LruKReplacer::new(config.pool_size, config.replacer_k)),
            EvictionPolicy::Clock => Box::new(ClockReplacer::new(config.pool_size)),
        };

        // Every frame starts out unused
        let free_list = (0..config.pool_size).map(FrameId::new).collect();

        Ok(Self {
            latch: Mutex::new(PoolState {
                page_table: ExtendibleHashTable::new(config.bucket_size),
                free_list,
                replacer,
                next_page_id: 0,
            }),
            frames,
            disk,
            log_manager: None,
            config,
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Attaches a log manager. The pool only holds the reference.
    pub fn with_log_manager(mut self, log_manager: Arc<LogManager>) -> Self {
        self.log_manager = Some(log_manager);
        self
    }

    /// Allocates a fresh page and returns its frame, pinned.
    ///
    /// The frame buffer is zeroed and the new page id can be read off the
    /// frame. Fails with [`BufferError::PoolExhausted`] when every frame
    /// is pinned; no page id is consumed in that case.
    pub fn new_page(&self) -> BufferResult<Arc<BufferFrame>> {
        let state = &mut *self.latch.lock();
        let frame_id = self.acquire_frame(state)?;
        let page_id = Self::allocate_page(state);

        let frame = &self.frames[frame_id.index()];
        frame.write_data().fill(0);
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id);
        state.replacer.pin(frame_id);

        trace!(page_id = %page_id, frame_id = frame_id.index(), "allocated new page");
        Ok(Arc::clone(frame))
    }

    /// Returns the requested page, pinned, loading it from disk if it is
    /// not resident.
    ///
    /// Fails with [`BufferError::PoolExhausted`] when the page is absent
    /// and every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<Arc<BufferFrame>> {
        if !page_id.is_valid() {
            return Err(BufferError::page_not_found(page_id));
        }
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let state = &mut *self.latch.lock();
        if let Some(frame_id) = state.page_table.find(&page_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            state.replacer.record_access(frame_id);
            state.replacer.pin(frame_id);
            return Ok(Arc::clone(frame));
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame(state)?;
        let frame = &self.frames[frame_id.index()];

        let read = {
            let mut data = frame.write_data();
            self.disk.read_page(page_id, &mut data[..])
        };
        if let Err(e) = read {
            // The frame was already disconnected from its old page; park it
            frame.reset();
            state.free_list.push_back(frame_id);
            return Err(e.into());
        }

        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id);
        state.replacer.pin(frame_id);

        trace!(page_id = %page_id, frame_id = frame_id.index(), "fetched page from disk");
        Ok(Arc::clone(frame))
    }

    /// Releases one pin on `page_id`, folding `is_dirty` into the frame's
    /// dirty flag. The frame becomes evictable when its last pin drops.
    ///
    /// Fails if the page is not resident or not pinned; the dirty flag is
    /// untouched in either case.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> BufferResult<()> {
        let state = &mut *self.latch.lock();
        let frame_id = state
            .page_table
            .find(&page_id)
            .ok_or(BufferError::PageNotFound { page_id })?;
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return Err(BufferError::NotPinned { page_id });
        }

        // Once dirty, a frame stays dirty until flushed
        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            state.replacer.unpin(frame_id);
        }
        Ok(())
    }

    /// Writes `page_id`'s buffer to disk and clears its dirty flag,
    /// regardless of pin count.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<()> {
        let state = &mut *self.latch.lock();
        let frame_id = state
            .page_table
            .find(&page_id)
            .ok_or(BufferError::PageNotFound { page_id })?;
        let frame = &self.frames[frame_id.index()];

        {
            let data = frame.read_data();
            self.disk.write_page(page_id, &data[..])?;
        }
        frame.set_dirty(false);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        trace!(page_id = %page_id, "flushed page");
        Ok(())
    }

    /// Writes back every resident page and clears all dirty flags.
    pub fn flush_all_pages(&self) -> BufferResult<()> {
        let _state = self.latch.lock();
        let mut flushed = 0u64;
        for frame in &self.frames {
            let page_id = frame.page_id();
            if !page_id.is_valid() {
                continue;
            }
            {
                let data = frame.read_data();
                self.disk.write_page(page_id, &data[..])?;
            }
            frame.set_dirty(false);
            flushed += 1;
        }
        self.flush_count.fetch_add(flushed, Ordering::Relaxed);
        debug!(pages = flushed, "flushed all resident pages");
        Ok(())
    }

    /// Drops `page_id` from the pool, returning its frame to the free
    /// list.
    ///
    /// Deleting an absent page succeeds as a no-op. Deleting a pinned page
    /// fails with [`BufferError::PagePinned`] and changes nothing.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<()> {
        let state = &mut *self.latch.lock();
        let Some(frame_id) = state.page_table.find(&page_id) else {
            return Ok(());
        };
        let frame = &self.frames[frame_id.index()];
        let pin_count = frame.pin_count();
        if pin_count > 0 {
            return Err(BufferError::PagePinned { page_id, pin_count });
        }

        state.replacer.remove(frame_id);
        state.page_table.remove(&page_id);
        frame.reset();
        state.free_list.push_back(frame_id);
        Self::deallocate_page(page_id);

        trace!(page_id = %page_id, frame_id = frame_id.index(), "deleted page");
        Ok(())
    }

    /// Fetches a page for reading behind a guard that unpins on drop.
    pub fn fetch_page_read(&self, page_id: PageId) -> BufferResult<PageReadGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(self, frame))
    }

    /// Fetches a page for writing behind a guard that unpins on drop.
    pub fn fetch_page_write(&self, page_id: PageId) -> BufferResult<PageWriteGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageWriteGuard::new(self, frame))
    }

    /// Allocates a fresh page behind a write guard.
    pub fn new_page_write(&self) -> BufferResult<PageWriteGuard<'_>> {
        let frame = self.new_page()?;
        Ok(PageWriteGuard::new(self, frame))
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    /// Returns the page size in bytes.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Returns true if `page_id` is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        let state = self.latch.lock();
        state.page_table.find(&page_id).is_some()
    }

    /// Returns a snapshot of the pool's counters and gauges.
    pub fn stats(&self) -> BufferPoolStats {
        let state = self.latch.lock();
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }
        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
            free_frames: state.free_list.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers (latch held by the caller)
    // -------------------------------------------------------------------------

    /// Secures an unused frame: the free list first, then a victim from
    /// the replacer. A dirty victim is written back and its page-table
    /// entry removed before the frame is handed out.
    fn acquire_frame(&self, state: &mut PoolState) -> BufferResult<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let victim = state.replacer.evict().ok_or(BufferError::PoolExhausted)?;
        let frame = &self.frames[victim.index()];
        let old_page = frame.page_id();
        debug_assert!(old_page.is_valid(), "evictable frame holds no page");
        debug_assert!(!frame.is_pinned(), "evicted a pinned frame");

        if frame.is_dirty() {
            debug!(page_id = %old_page, frame_id = victim.index(), "writing back dirty victim");
            let written = {
                let data = frame.read_data();
                self.disk.write_page(old_page, &data[..])
            };
            if let Err(e) = written {
                // The page stays resident and evictable
                state.replacer.record_access(victim);
                state.replacer.unpin(victim);
                return Err(e.into());
            }
            frame.set_dirty(false);
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }

        state.page_table.remove(&old_page);
        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        Ok(victim)
    }

    /// Hands out the next page id.
    fn allocate_page(state: &mut PoolState) -> PageId {
        let page_id = PageId::new(state.next_page_id);
        state.next_page_id += 1;
        page_id
    }

    /// Hook for a future free-space manager; page ids are not reused.
    fn deallocate_page(_page_id: PageId) {}
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.config.pool_size)
            .field("page_size", &self.config.page_size)
            .field("policy", &self.config.policy)
            .field("has_log_manager", &self.log_manager.is_some())
            .finish()
    }
}
