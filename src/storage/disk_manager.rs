//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages at `page_id × PAGE_SIZE` offsets
//! - Tracking deallocated pages
//! - Managing the database file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// The database is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// Page ids are handed out by the buffer pool's sharded counter, so the
/// file can be written sparsely: a pool of 4 instances writes ids
/// 0, 4, 8, … from instance 0 long before instance 1 touches id 1.
/// Writes therefore extend the file as needed, and a read of a page that
/// was allocated but never written back returns a zeroed page.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The buffer pool serializes
/// access to it behind a mutex.
///
/// # Durability
/// All writes are followed by `fsync()`. Conservative, but the core has
/// no WAL to fall back on.
pub struct DiskManager {
    file: File,
}

impl DiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self { file })
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self { file })
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// Pages beyond the end of the file (allocated but never written back)
    /// read as all zeros.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        let mut page = Page::new();

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        let file_size = self.file.metadata()?.len();
        if offset >= file_size {
            return Ok(page);
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    /// Write a page to disk, extending the file if the offset lies past
    /// the current end.
    ///
    /// # Durability
    /// Calls `fsync()` after writing.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Release a page id back to the disk manager.
    ///
    /// Bookkeeping hook called when the buffer pool deletes a page.
    /// Space reclamation (free-page map, file truncation) is a separate
    /// milestone; until then this records nothing.
    pub fn deallocate_page(&mut self, _page_id: PageId) {}

    /// Number of whole pages the file currently spans.
    pub fn page_capacity(&self) -> Result<u32> {
        Ok((self.file.metadata()?.len() / PAGE_SIZE as u64) as u32)
    }

    /// Total size of the database file in bytes.
    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
