//! File-backed disk manager.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use boreal_common::types::PageId;
use parking_lot::Mutex;

use super::DiskManager;

/// Stores pages in a single data file at `page_id * page_size` offsets.
///
/// The file handle is shared behind a mutex; every operation seeks and
/// transfers one whole page. Reads past the end of the file yield zeroed
/// pages, so freshly allocated pages need no explicit formatting pass.
pub struct FileDiskManager {
    file: Mutex<File>,
    path: PathBuf,
    page_size: usize,
}

impl FileDiskManager {
    /// Opens (creating if needed) the data file at `path`.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
            page_size,
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the page size this manager was opened with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Forces all written pages to stable storage.
    pub fn sync(&self) -> io::Result<()> {
        self.file.lock().sync_all()
    }

    fn offset_of(&self, page_id: PageId) -> io::Result<u64> {
        if !page_id.is_valid() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid page id",
            ));
        }
        Ok(page_id.as_u64() * self.page_size as u64)
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let offset = self.offset_of(page_id)?;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        // Short read: the page lies past the end of the file
        buf[total..].fill(0);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let offset = self.offset_of(page_id)?;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)
    }
}

impl std::fmt::Debug for FileDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDiskManager")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .finish()
    }
}
