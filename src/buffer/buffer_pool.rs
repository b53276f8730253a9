//! The buffer pool interface.

use crate::buffer::Frame;
use crate::common::{PageId, Result};

/// Common interface of [`BufferPoolInstance`](crate::buffer::BufferPoolInstance)
/// and [`ParallelBufferPool`](crate::buffer::ParallelBufferPool).
///
/// Storage structures (the hash index, future table heaps) are written
/// against this trait so a single instance and a sharded pool are
/// interchangeable.
///
/// # Pin discipline
/// `fetch_page` and `new_page` return a pinned frame. While the caller
/// holds the reference the pin count stays positive and the frame cannot
/// be evicted; the caller must call `unpin_page` exactly once per
/// successful fetch/new and stop using the reference afterwards. A leaked
/// pin permanently removes a frame from circulation.
pub trait BufferPool: Send + Sync {
    /// Pin the frame holding `page_id`, loading it from disk if needed.
    ///
    /// # Errors
    /// - [`Error::NoFreeFrame`](crate::common::Error::NoFreeFrame) if the
    ///   free list and the replacer are both empty
    /// - [`Error::Io`](crate::common::Error::Io) from disk I/O
    fn fetch_page(&self, page_id: PageId) -> Result<&Frame>;

    /// Allocate a fresh page id and pin a zeroed frame for it.
    ///
    /// # Errors
    /// Same as [`fetch_page`](Self::fetch_page), minus the read.
    fn new_page(&self) -> Result<(PageId, &Frame)>;

    /// Release one pin on `page_id`, marking the frame dirty if
    /// `is_dirty` (the dirty flag is sticky; `is_dirty = false` never
    /// clears it).
    ///
    /// Returns `false` iff the page is resident with pin count 0, which
    /// is a caller bug. Unpinning a non-resident page is a no-op
    /// returning `true`.
    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool;

    /// Write `page_id`'s frame to disk. Does not clear the dirty flag.
    ///
    /// Returns `Ok(false)` if the page is not resident.
    fn flush_page(&self, page_id: PageId) -> Result<bool>;

    /// Write every resident page to disk.
    fn flush_all_pages(&self) -> Result<()>;

    /// Drop `page_id` from the pool and release its id to the disk
    /// manager.
    ///
    /// Returns `false` iff the page is resident and pinned. Deleting a
    /// non-resident page is a no-op returning `true`.
    fn delete_page(&self, page_id: PageId) -> bool;

    /// Total number of frames.
    fn pool_size(&self) -> usize;
}
