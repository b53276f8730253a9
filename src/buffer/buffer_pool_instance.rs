//! Buffer Pool Instance - the core page caching layer.
//!
//! A [`BufferPoolInstance`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Write-back of dirty pages on eviction
//! - Sharded page id allocation for use under a
//!   [`ParallelBufferPool`](crate::buffer::ParallelBufferPool)

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::{BufferPool, BufferPoolStats, Frame, LruReplacer};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Bookkeeping guarded by the instance latch.
struct Inner {
    /// Maps resident page IDs to frame IDs (a bijection).
    page_table: HashMap<PageId, FrameId>,

    /// Frames holding no page. Victims pop from the back; deleted pages
    /// return to the front.
    free_list: VecDeque<FrameId>,

    /// Eviction policy over resident, unpinned frames.
    replacer: LruReplacer,

    /// Next page id this instance will hand out. Starts at
    /// `instance_index` and advances by `num_instances`, so every id
    /// allocated here satisfies `id % num_instances == instance_index`.
    next_page_id: u32,
}

/// Manages a fixed pool of frames caching disk pages.
///
/// ```text
/// ┌────────────────────────────────────────────────────────────┐
/// │                    BufferPoolInstance                      │
/// │  ┌──────────────────── latch ───────────────────────────┐  │
/// │  │ page_table   free_list   replacer   next_page_id     │  │
/// │  └──────────────────────────────────────────────────────┘  │
/// │  ┌──────────────────────────────┐  ┌──────────────────┐    │
/// │  │      frames: Vec<Frame>      │  │  disk_manager    │    │
/// │  │ [Frame0] [Frame1] [Frame2] … │  │  (Arc<Mutex>)    │    │
/// │  └──────────────────────────────┘  └──────────────────┘    │
/// └────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// One exclusive latch guards all bookkeeping and is held for the
/// entirety of every public operation; the code paths are short and
/// dominated by disk I/O, so finer locking buys nothing. Frames live
/// outside the latch with interior mutability so callers can keep using
/// a pinned frame after the call returns.
///
/// # Usage
/// ```no_run
/// use hearthdb::buffer::{BufferPool, BufferPoolInstance};
/// use hearthdb::storage::DiskManager;
///
/// let dm = DiskManager::create("test.db").unwrap();
/// let bpm = BufferPoolInstance::new(10, dm);
///
/// let (pid, frame) = bpm.new_page().unwrap();
/// frame.page_mut().as_mut_slice()[0] = 0xAB;
/// bpm.unpin_page(pid, true);
/// ```
pub struct BufferPoolInstance {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Bookkeeping behind the instance latch.
    inner: Mutex<Inner>,

    /// Handles all disk I/O; shared with sibling instances in a parallel
    /// pool.
    disk_manager: Arc<Mutex<DiskManager>>,

    /// Performance counters.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,

    /// Sharding parameters for page id allocation.
    num_instances: u32,
    instance_index: u32,
}

impl BufferPoolInstance {
    /// Create a standalone instance (a "pool" of one shard).
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        Self::new_sharded(pool_size, 1, 0, Arc::new(Mutex::new(disk_manager)))
    }

    /// Create one shard of a parallel pool.
    ///
    /// # Panics
    /// Panics if `pool_size` or `num_instances` is 0, or if
    /// `instance_index >= num_instances`.
    pub fn new_sharded(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk_manager: Arc<Mutex<DiskManager>>,
    ) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        assert!(num_instances > 0, "num_instances must be > 0");
        assert!(
            instance_index < num_instances,
            "instance_index must be below num_instances"
        );

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: VecDeque<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            inner: Mutex::new(Inner {
                page_table: HashMap::new(),
                free_list,
                replacer: LruReplacer::new(pool_size),
                next_page_id: instance_index,
            }),
            disk_manager,
            stats: BufferPoolStats::new(),
            pool_size,
            num_instances,
            instance_index,
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Which shard this instance is.
    pub fn instance_index(&self) -> u32 {
        self.instance_index
    }

    /// Number of frames currently on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.inner.lock().free_list.len()
    }

    /// Number of pages resident in the pool.
    pub fn resident_page_count(&self) -> usize {
        self.inner.lock().page_table.len()
    }

    /// Pin count of `page_id`, or None if it is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let inner = self.inner.lock();
        inner
            .page_table
            .get(&page_id)
            .map(|&fid| self.frames[fid.0].pin_count())
    }

    // ========================================================================
    // Internal: page id allocation and victim selection
    // ========================================================================

    /// Hand out the next sharded page id.
    fn allocate_page(&self, inner: &mut Inner) -> PageId {
        let page_id = PageId::new(inner.next_page_id);
        inner.next_page_id += self.num_instances;
        debug_assert_eq!(page_id.shard(self.num_instances), self.instance_index);
        page_id
    }

    /// Obtain a frame to load a page into: free list first, then the
    /// replacer. The returned frame is unmapped, unpinned and clean;
    /// the evicted page (if any) has been written back.
    fn acquire_frame(&self, inner: &mut Inner) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_back() {
            return Ok(frame_id);
        }

        let frame_id = inner.replacer.victim().ok_or(Error::NoFreeFrame)?;
        let frame = &self.frames[frame_id.0];

        let old_page_id = frame
            .page_id()
            .expect("replacer returned a frame with no page");

        if frame.is_dirty() {
            let page = frame.page();
            self.disk_manager.lock().write_page(old_page_id, &page)?;
            drop(page);
            frame.clear_dirty();
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        }

        inner.page_table.remove(&old_page_id);
        frame.clear_meta();
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);

        Ok(frame_id)
    }

    /// Write one resident frame to disk (dirty or not). The dirty flag is
    /// left untouched: it is cleared only by eviction write-back.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];
        let page = frame.page();
        self.disk_manager.lock().write_page(page_id, &page)?;
        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl BufferPool for BufferPoolInstance {
    fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        let mut inner = self.inner.lock();

        // Hit: pin and return.
        if let Some(frame_id) = inner.page_table.get(&page_id).copied() {
            let frame = &self.frames[frame_id.0];
            frame.pin();
            inner.replacer.pin(frame_id);
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(frame);
        }

        // Miss: take a frame and read the page in.
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame(&mut inner)?;
        let frame = &self.frames[frame_id.0];

        let page = self.disk_manager.lock().read_page(page_id)?;
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        frame
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page.as_slice());
        frame.set_page_id(Some(page_id));
        frame.clear_dirty();
        frame.pin();
        inner.page_table.insert(page_id, frame_id);

        Ok(frame)
    }

    fn new_page(&self) -> Result<(PageId, &Frame)> {
        let mut inner = self.inner.lock();

        let frame_id = self.acquire_frame(&mut inner)?;
        let page_id = self.allocate_page(&mut inner);
        let frame = &self.frames[frame_id.0];

        frame.page_mut().reset();
        frame.set_page_id(Some(page_id));
        frame.clear_dirty();
        frame.pin();
        inner.page_table.insert(page_id, frame_id);

        Ok((page_id, frame))
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return true, // not resident: nothing was held
        };

        let frame = &self.frames[frame_id.0];
        if frame.pin_count() == 0 {
            return false; // caller bug: unpin without a matching pin
        }

        if is_dirty {
            frame.mark_dirty();
        }
        if frame.unpin() == 0 {
            inner.replacer.unpin(frame_id);
        }

        true
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return Ok(false),
        };

        self.flush_frame(frame_id, page_id)?;
        Ok(true)
    }

    fn flush_all_pages(&self) -> Result<()> {
        let inner = self.inner.lock();

        for (&page_id, &frame_id) in &inner.page_table {
            self.flush_frame(frame_id, page_id)?;
        }

        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> bool {
        let mut inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return true, // not resident: nothing to do
        };

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return false;
        }

        self.disk_manager.lock().deallocate_page(page_id);
        inner.page_table.remove(&page_id);
        // The frame was unpinned, so the replacer holds it.
        inner.replacer.pin(frame_id);
        frame.clear_meta();
        inner.free_list.push_front(frame_id);

        true
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }
}
