//! In-memory disk manager for tests and benchmarks.

use std::collections::HashMap;
use std::io;

use boreal_common::types::PageId;
use parking_lot::Mutex;

use super::DiskManager;

/// A heap-backed page store.
///
/// Behaves like [`super::FileDiskManager`] (unwritten pages read as
/// zeroes) and additionally keeps a log of page writes in order, so tests
/// can assert that a dirty victim was written back before its frame was
/// reused.
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, Box<[u8]>>>,
    write_log: Mutex<Vec<PageId>>,
    page_size: usize,
}

impl MemoryDiskManager {
    /// Creates an empty store for pages of `page_size` bytes.
    pub fn new(page_size: usize) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            write_log: Mutex::new(Vec::new()),
            page_size,
        }
    }

    /// Returns the page size this store was created with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the number of pages that have ever been written.
    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }

    /// Returns every page write observed so far, oldest first.
    pub fn write_log(&self) -> Vec<PageId> {
        self.write_log.lock().clone()
    }

    /// Forgets the recorded write order (stored pages are untouched).
    pub fn clear_write_log(&self) {
        self.write_log.lock().clear();
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        if !page_id.is_valid() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid page id",
            ));
        }
        match self.pages.lock().get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        if !page_id.is_valid() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid page id",
            ));
        }
        self.pages.lock().insert(page_id, buf.into());
        self.write_log.lock().push(page_id);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDiskManager")
            .field("page_size", &self.page_size)
            .field("page_count", &self.page_count())
            .finish()
    }
}
