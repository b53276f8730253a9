//! Parallel Buffer Pool - shards pages across independent instances.
//!
//! Contention on a single instance latch serializes every caller. The
//! [`ParallelBufferPool`] splits the frame budget across
//! `num_instances` [`BufferPoolInstance`]s; operations on distinct shards
//! proceed in parallel.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::buffer::{BufferPool, BufferPoolInstance, Frame};
use crate::common::{Error, PageId, Result};
use crate::storage::DiskManager;

/// A buffer pool sharded over `num_instances` instances.
///
/// # Routing
/// Every instance allocates page ids congruent to its own index modulo
/// `num_instances`, so any page id routes to its owner in O(1):
/// `instances[page_id % num_instances]`.
///
/// `new_page` has no routing key; it probes instances round-robin from a
/// rotating start index, taking the first instance with a frame to spare.
/// The pool's own latch guards only that start index; each probe
/// serializes on the per-instance latch alone.
pub struct ParallelBufferPool {
    instances: Vec<BufferPoolInstance>,

    /// Where the next `new_page` starts probing. Advances by one per call
    /// regardless of outcome to spread allocation load.
    start_index: Mutex<usize>,
}

impl ParallelBufferPool {
    /// Create `num_instances` shards of `pool_size` frames each, all
    /// backed by the same database file.
    ///
    /// # Panics
    /// Panics if `num_instances` or `pool_size` is 0.
    pub fn new(num_instances: u32, pool_size: usize, disk_manager: DiskManager) -> Self {
        assert!(num_instances > 0, "num_instances must be > 0");

        let disk_manager = Arc::new(Mutex::new(disk_manager));
        let instances = (0..num_instances)
            .map(|i| {
                BufferPoolInstance::new_sharded(pool_size, num_instances, i, Arc::clone(&disk_manager))
            })
            .collect();

        Self {
            instances,
            start_index: Mutex::new(0),
        }
    }

    /// Number of shards.
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// The instance owning `page_id`.
    pub fn instance_for(&self, page_id: PageId) -> &BufferPoolInstance {
        &self.instances[page_id.shard(self.instances.len() as u32) as usize]
    }
}

impl BufferPool for ParallelBufferPool {
    fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        self.instance_for(page_id).fetch_page(page_id)
    }

    fn new_page(&self) -> Result<(PageId, &Frame)> {
        // Claim a starting instance and advance the cursor; the probes
        // themselves run outside the pool latch.
        let begin = {
            let mut start = self.start_index.lock();
            let begin = *start;
            *start = (begin + 1) % self.instances.len();
            begin
        };

        for offset in 0..self.instances.len() {
            let index = (begin + offset) % self.instances.len();
            match self.instances[index].new_page() {
                Ok(result) => return Ok(result),
                Err(Error::NoFreeFrame) => continue,
                Err(err) => return Err(err),
            }
        }

        Err(Error::NoFreeFrame)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool> {
        self.instance_for(page_id).flush_page(page_id)
    }

    fn flush_all_pages(&self) -> Result<()> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> bool {
        self.instance_for(page_id).delete_page(page_id)
    }

    fn pool_size(&self) -> usize {
        self.instances.iter().map(|i| i.pool_size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_pool(num_instances: u32, pool_size: usize) -> (ParallelBufferPool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("test.db")).unwrap();
        (ParallelBufferPool::new(num_instances, pool_size, dm), dir)
    }

    #[test]
    fn test_pool_size_sums_instances() {
        let (pool, _dir) = create_pool(4, 3);
        assert_eq!(pool.pool_size(), 12);
        assert_eq!(pool.num_instances(), 4);
    }

    #[test]
    fn test_allocated_ids_route_to_owner() {
        let (pool, _dir) = create_pool(4, 3);

        for _ in 0..8 {
            let (pid, _) = pool.new_page().unwrap();
            pool.unpin_page(pid, false);

            let owner = pool.instance_for(pid);
            assert_eq!(pid.shard(4), owner.instance_index());
            assert_eq!(owner.get_pin_count(pid), Some(0));
        }
    }

    #[test]
    fn test_round_robin_spreads_allocation() {
        let (pool, _dir) = create_pool(4, 2);

        // 4 allocations land on 4 distinct instances
        let mut pids = Vec::new();
        for _ in 0..4 {
            let (pid, _) = pool.new_page().unwrap();
            pool.unpin_page(pid, false);
            pids.push(pid);
        }

        let mut shards: Vec<u32> = pids.iter().map(|p| p.0 % 4).collect();
        shards.sort();
        assert_eq!(shards, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_new_page_probes_past_full_instances() {
        let (pool, _dir) = create_pool(2, 1);

        // Fill both single-frame instances, keeping the pages pinned.
        let (pid0, _) = pool.new_page().unwrap();
        let (pid1, _) = pool.new_page().unwrap();

        // Every instance is pinned full.
        assert!(matches!(pool.new_page(), Err(Error::NoFreeFrame)));

        // Freeing one instance lets the probe succeed wherever it starts.
        pool.unpin_page(pid0, false);
        let (pid2, _) = pool.new_page().unwrap();
        assert_eq!(pid2.0 % 2, pid0.0 % 2);
        pool.unpin_page(pid2, false);
        pool.unpin_page(pid1, false);
    }

    #[test]
    fn test_write_read_across_instances() {
        let (pool, _dir) = create_pool(3, 2);

        let mut pids = Vec::new();
        for i in 0u8..6 {
            let (pid, frame) = pool.new_page().unwrap();
            frame.page_mut().as_mut_slice()[0] = i;
            pool.unpin_page(pid, true);
            pids.push(pid);
        }

        for (i, &pid) in pids.iter().enumerate() {
            let frame = pool.fetch_page(pid).unwrap();
            assert_eq!(frame.page().as_slice()[0], i as u8);
            pool.unpin_page(pid, false);
        }
    }

    #[test]
    fn test_concurrent_new_page() {
        use std::thread;

        let (pool, _dir) = create_pool(4, 8);
        let pool = Arc::new(pool);

        let mut handles = vec![];
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                let mut pids = Vec::new();
                for _ in 0..6 {
                    let (pid, _) = pool.new_page().unwrap();
                    pool.unpin_page(pid, false);
                    pids.push(pid);
                }
                pids
            }));
        }

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .map(|p| p.0)
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 24, "allocated page ids must be unique");
    }
}
