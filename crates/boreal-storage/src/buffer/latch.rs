//! RAII page guards.
//!
//! Guards keep their frame pinned and release the pin through the pool
//! when dropped, so the replacer learns about the frame becoming
//! evictable. The write guard remembers whether the data was touched and
//! unpins dirty accordingly.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use boreal_common::types::PageId;

use super::frame::{BufferFrame, FrameId};
use super::pool::BufferPoolManager;

/// Read guard for a page in the buffer pool.
pub struct PageReadGuard<'a> {
    pool: &'a BufferPoolManager,
    frame: Arc<BufferFrame>,
    page_id: PageId,
}

impl<'a> PageReadGuard<'a> {
    /// Wraps an already pinned frame.
    pub(crate) fn new(pool: &'a BufferPoolManager, frame: Arc<BufferFrame>) -> Self {
        let page_id = frame.page_id();
        Self {
            pool,
            frame,
            page_id,
        }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Returns a reference to the page data.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        let _ = self.pool.unpin_page(self.page_id, false);
    }
}

impl std::fmt::Debug for PageReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageReadGuard")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame.frame_id())
            .finish()
    }
}

struct PageDataRef<'a> {
    guard: parking_lot::RwLockReadGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Write guard for a page in the buffer pool.
///
/// Accessing the data mutably marks the page dirty; the pin is released
/// on drop with the accumulated dirty flag.
pub struct PageWriteGuard<'a> {
    pool: &'a BufferPoolManager,
    frame: Arc<BufferFrame>,
    page_id: PageId,
    modified: bool,
}

impl<'a> PageWriteGuard<'a> {
    /// Wraps an already pinned frame.
    pub(crate) fn new(pool: &'a BufferPoolManager, frame: Arc<BufferFrame>) -> Self {
        let page_id = frame.page_id();
        Self {
            pool,
            frame,
            page_id,
            modified: false,
        }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Returns a reference to the page data.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }

    /// Returns a mutable reference to the page data and marks the page
    /// dirty.
    #[inline]
    pub fn data_mut(&mut self) -> impl DerefMut<Target = [u8]> + '_ {
        self.modified = true;
        PageDataMut {
            guard: self.frame.write_data(),
        }
    }

    /// Marks the page dirty without touching the data.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.modified = true;
    }

    /// Returns true if the page was modified through this guard.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        let _ = self.pool.unpin_page(self.page_id, self.modified);
    }
}

impl std::fmt::Debug for PageWriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWriteGuard")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame.frame_id())
            .field("modified", &self.modified)
            .finish()
    }
}

struct PageDataMut<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageDataMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::config::BufferPoolConfig;
    use super::super::pool::BufferPoolManager;
    use crate::disk::MemoryDiskManager;

    const PAGE_SIZE: usize = 512;

    fn test_pool(pool_size: usize) -> BufferPoolManager {
        let config = BufferPoolConfig::new(pool_size).with_page_size(PAGE_SIZE);
        let disk = Arc::new(MemoryDiskManager::new(PAGE_SIZE));
        BufferPoolManager::new(config, disk).unwrap()
    }

    #[test]
    fn test_read_guard_unpins_on_drop() {
        let pool = test_pool(2);
        let page_id = {
            let guard = pool.new_page_write().unwrap();
            guard.page_id()
        };

        {
            let guard = pool.fetch_page_read(page_id).unwrap();
            assert_eq!(guard.page_id(), page_id);
            assert_eq!(pool.stats().pinned_frames, 1);
        }
        assert_eq!(pool.stats().pinned_frames, 0);
    }

    #[test]
    fn test_write_guard_marks_dirty_on_touch() {
        let pool = test_pool(2);
        let page_id = {
            let mut guard = pool.new_page_write().unwrap();
            guard.data_mut()[0..3].copy_from_slice(b"abc");
            assert!(guard.is_modified());
            guard.page_id()
        };

        assert_eq!(pool.stats().dirty_frames, 1);

        let guard = pool.fetch_page_read(page_id).unwrap();
        assert_eq!(&guard.data()[0..3], b"abc");
    }

    #[test]
    fn test_untouched_write_guard_stays_clean() {
        let pool = test_pool(2);
        {
            let guard = pool.new_page_write().unwrap();
            assert!(!guard.is_modified());
        }
        assert_eq!(pool.stats().dirty_frames, 0);
    }

    #[test]
    fn test_mark_dirty_without_write() {
        let pool = test_pool(2);
        {
            let mut guard = pool.new_page_write().unwrap();
            guard.mark_dirty();
        }
        assert_eq!(pool.stats().dirty_frames, 1);
    }

    #[test]
    fn test_nested_guards_share_the_frame() {
        let pool = test_pool(2);
        let page_id = {
            let guard = pool.new_page_write().unwrap();
            guard.page_id()
        };

        let first = pool.fetch_page_read(page_id).unwrap();
        let second = pool.fetch_page_read(page_id).unwrap();
        assert_eq!(first.frame_id(), second.frame_id());

        drop(first);
        assert_eq!(pool.stats().pinned_frames, 1);
        drop(second);
        assert_eq!(pool.stats().pinned_frames, 0);
    }
}
