//! Extendible hash table index.
//!
//! A disk-resident hash table built entirely on the buffer pool: one
//! directory page mapping hash prefixes to bucket pages, growing and
//! shrinking by powers of two as buckets split and merge.
//!
//! ```text
//!                 directory (global depth g)
//!            ┌──────┬──────┬──────┬──────┐
//!  hash low  │ 00   │ 01   │ 10   │ 11   │
//!  g bits ──▶│  •   │  •   │  •   │  •   │
//!            └──┼───┴──┼───┴──┼───┴──┼───┘
//!               ▼      ▼      ▼      ▼
//!            bucket  bucket bucket (buckets with local depth < g
//!            pages   pages  pages   are shared by several slots)
//! ```
//!
//! Lookups resolve `hash(key) & global_depth_mask` to a directory slot,
//! then operate on that slot's bucket page. A full bucket splits: its
//! local depth rises by one, a fresh bucket takes the entries whose next
//! hash bit is set, and the directory doubles first if the bucket was
//! already at global depth. An emptied bucket merges back into its split
//! image and the directory halves while every local depth sits below the
//! global depth.
//!
//! # Concurrency
//! A table-wide reader/writer latch serializes structural changes:
//! `get_value` takes it shared, `insert`/`remove` (and the splits and
//! merges they trigger) take it exclusive. Page-level consistency comes
//! from the buffer pool's pin discipline.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::buffer::BufferPool;
use crate::common::{PageId, Result};
use crate::concurrency::Transaction;
use crate::index::key::{KeyComparator, KeyHasher, Storable};
use crate::storage::page::hash_table_page_defs::MAX_LOCAL_DEPTH;
use crate::storage::page::{HashTableBucketPage, HashTableDirectoryPage};

/// A buffer-pool-backed extendible hash table.
///
/// Generic over the key codec `K`, value codec `V`, comparator `C` and
/// hash function `H`. Keys are non-unique: the same key may map to many
/// values, but exact `(key, value)` duplicates are rejected.
pub struct ExtendibleHashTable<K, V, C, H> {
    buffer_pool: Arc<dyn BufferPool>,
    comparator: C,
    hasher: H,

    /// Directory page id; INVALID until the first operation touches the
    /// table. The mutex serializes lazy creation under the shared latch.
    directory_page_id: Mutex<PageId>,

    /// Table-wide latch: shared for reads, exclusive for writes.
    table_latch: RwLock<()>,

    _marker: PhantomData<(K, V)>,
}

impl<K, V, C, H> ExtendibleHashTable<K, V, C, H>
where
    K: Storable,
    V: Storable,
    C: KeyComparator<K>,
    H: KeyHasher<K>,
{
    /// Create a table over `buffer_pool`. No pages are allocated until
    /// the first operation.
    pub fn new(buffer_pool: Arc<dyn BufferPool>, comparator: C, hasher: H) -> Self {
        Self {
            buffer_pool,
            comparator,
            hasher,
            directory_page_id: Mutex::new(PageId::INVALID),
            table_latch: RwLock::new(()),
            _marker: PhantomData,
        }
    }

    // ========================================================================
    // Public API
    // ========================================================================

    /// Collect every value stored under `key`.
    pub fn get_value(&self, _txn: &Transaction, key: &K) -> Result<Vec<V>> {
        let _guard = self.table_latch.read();

        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        let bucket_pid = {
            let mut dir_data = dir_frame.page_mut();
            let dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());
            let slot = self.hasher.hash_key(key) & dir.global_depth_mask();
            dir.bucket_page_id(slot)
        };

        let bucket_frame = self.buffer_pool.fetch_page(bucket_pid)?;
        let mut result = Vec::new();
        {
            let mut bucket_data = bucket_frame.page_mut();
            let bucket = HashTableBucketPage::<K, V>::attach(bucket_data.as_mut_slice());
            bucket.get_value(key, &self.comparator, &mut result);
        }

        self.buffer_pool.unpin_page(bucket_pid, false);
        self.buffer_pool.unpin_page(dir_pid, false);
        Ok(result)
    }

    /// Insert `(key, value)`.
    ///
    /// Returns `Ok(false)` if the exact pair is already present, or if the
    /// target bucket is full and cannot split any further.
    pub fn insert(&self, txn: &Transaction, key: &K, value: &V) -> Result<bool> {
        let _guard = self.table_latch.write();
        self.insert_internal(txn, key, value)
    }

    /// Remove `(key, value)`.
    ///
    /// Returns `Ok(false)` if no such pair exists. Emptying a bucket
    /// triggers a conservative merge with its split image.
    pub fn remove(&self, txn: &Transaction, key: &K, value: &V) -> Result<bool> {
        let _guard = self.table_latch.write();

        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        let bucket_pid = {
            let mut dir_data = dir_frame.page_mut();
            let dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());
            let slot = self.hasher.hash_key(key) & dir.global_depth_mask();
            dir.bucket_page_id(slot)
        };

        let bucket_frame = self.buffer_pool.fetch_page(bucket_pid)?;
        let (removed, now_empty) = {
            let mut bucket_data = bucket_frame.page_mut();
            let mut bucket = HashTableBucketPage::<K, V>::attach(bucket_data.as_mut_slice());
            let removed = bucket.remove(key, value, &self.comparator);
            (removed, bucket.is_empty())
        };

        self.buffer_pool.unpin_page(bucket_pid, removed);
        self.buffer_pool.unpin_page(dir_pid, false);

        if removed && now_empty {
            self.merge(txn, key)?;
        }
        Ok(removed)
    }

    /// Current global depth of the directory.
    pub fn global_depth(&self) -> Result<u32> {
        let _guard = self.table_latch.read();

        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        let depth = {
            let mut dir_data = dir_frame.page_mut();
            let dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());
            dir.global_depth()
        };
        self.buffer_pool.unpin_page(dir_pid, false);
        Ok(depth)
    }

    /// Assert the directory's structural invariants.
    ///
    /// # Panics
    /// Panics on the first violated invariant.
    pub fn verify_integrity(&self) -> Result<()> {
        let _guard = self.table_latch.read();

        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        {
            let mut dir_data = dir_frame.page_mut();
            let dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());
            dir.verify_integrity();
        }
        self.buffer_pool.unpin_page(dir_pid, false);
        Ok(())
    }

    // ========================================================================
    // Internal: directory lifecycle
    // ========================================================================

    /// Return the directory page id, creating the directory and its first
    /// bucket (local depth 0) on first touch.
    fn ensure_directory(&self) -> Result<PageId> {
        let mut dir_pid = self.directory_page_id.lock();
        if dir_pid.is_valid() {
            return Ok(*dir_pid);
        }

        let (new_dir_pid, dir_frame) = self.buffer_pool.new_page()?;
        let (bucket_pid, _bucket_frame) = self.buffer_pool.new_page()?;
        {
            let mut dir_data = dir_frame.page_mut();
            let mut dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());
            dir.set_page_id(new_dir_pid);
            dir.set_bucket_page_id(0, bucket_pid);
            dir.set_local_depth(0, 0);
        }
        // The zeroed bucket page already is an empty bucket.
        self.buffer_pool.unpin_page(bucket_pid, false);
        self.buffer_pool.unpin_page(new_dir_pid, true);

        *dir_pid = new_dir_pid;
        Ok(new_dir_pid)
    }

    // ========================================================================
    // Internal: insert / split (table latch held exclusively)
    // ========================================================================

    fn insert_internal(&self, txn: &Transaction, key: &K, value: &V) -> Result<bool> {
        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        let bucket_pid = {
            let mut dir_data = dir_frame.page_mut();
            let dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());
            let slot = self.hasher.hash_key(key) & dir.global_depth_mask();
            dir.bucket_page_id(slot)
        };

        let bucket_frame = self.buffer_pool.fetch_page(bucket_pid)?;
        // None means the bucket is full and the insert must split.
        let outcome = {
            let mut bucket_data = bucket_frame.page_mut();
            let mut bucket = HashTableBucketPage::<K, V>::attach(bucket_data.as_mut_slice());
            if bucket.is_full() {
                None
            } else {
                Some(bucket.insert(key, value, &self.comparator))
            }
        };

        match outcome {
            Some(inserted) => {
                self.buffer_pool.unpin_page(bucket_pid, inserted);
                self.buffer_pool.unpin_page(dir_pid, false);
                Ok(inserted)
            }
            None => {
                self.buffer_pool.unpin_page(bucket_pid, false);
                self.buffer_pool.unpin_page(dir_pid, false);
                self.split_insert(txn, key, value)
            }
        }
    }

    /// Split the full bucket `key` maps to, then retry the insert.
    ///
    /// Terminates because each split either separates at least one entry
    /// from the rest (the retry finds room) or the retried bucket is still
    /// full and splits again at a deeper depth, until `MAX_LOCAL_DEPTH`
    /// fails the insert.
    fn split_insert(&self, txn: &Transaction, key: &K, value: &V) -> Result<bool> {
        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        let mut dir_data = dir_frame.page_mut();
        let mut dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());

        let slot = self.hasher.hash_key(key) & dir.global_depth_mask();
        let old_pid = dir.bucket_page_id(slot);
        let depth = dir.local_depth(slot);

        if depth + 1 > MAX_LOCAL_DEPTH {
            drop(dir);
            drop(dir_data);
            self.buffer_pool.unpin_page(dir_pid, false);
            return Ok(false);
        }

        if depth == dir.global_depth() {
            dir.incr_global_depth();
        }

        // Fresh bucket for the half of the entries whose hash has bit
        // `depth` set; the rest stay behind.
        let (new_pid, new_frame) = self.buffer_pool.new_page()?;
        let old_frame = self.buffer_pool.fetch_page(old_pid)?;
        {
            let mut old_data = old_frame.page_mut();
            let mut old_bucket = HashTableBucketPage::<K, V>::attach(old_data.as_mut_slice());
            let entries = old_bucket.get_all();
            old_bucket.reset();

            let mut new_data = new_frame.page_mut();
            let mut new_bucket = HashTableBucketPage::<K, V>::attach(new_data.as_mut_slice());

            for (k, v) in &entries {
                if (self.hasher.hash_key(k) >> depth) & 1 == 1 {
                    new_bucket.insert(k, v, &self.comparator);
                } else {
                    old_bucket.insert(k, v, &self.comparator);
                }
            }
        }

        // Rewrite the directory slots that shared the old bucket: the
        // class of slots agreeing with `slot` on the low `depth` bits.
        // Bit `depth` now distinguishes old from new.
        let low_bits = slot & ((1 << depth) - 1);
        for j in 0..dir.size() {
            if j & ((1 << depth) - 1) != low_bits {
                continue;
            }
            dir.set_local_depth(j, depth + 1);
            if (j >> depth) & 1 == 1 {
                dir.set_bucket_page_id(j, new_pid);
            } else {
                dir.set_bucket_page_id(j, old_pid);
            }
        }

        drop(dir);
        drop(dir_data);
        self.buffer_pool.unpin_page(dir_pid, true);
        self.buffer_pool.unpin_page(old_pid, true);
        self.buffer_pool.unpin_page(new_pid, true);

        self.insert_internal(txn, key, value)
    }

    // ========================================================================
    // Internal: merge (table latch held exclusively)
    // ========================================================================

    /// Fold the emptied bucket `key` maps to back into its split image.
    ///
    /// Conservative policy: only merges when the pair has equal, non-zero
    /// local depths. Afterwards the directory halves as long as every
    /// local depth sits below the global depth.
    fn merge(&self, _txn: &Transaction, key: &K) -> Result<()> {
        let dir_pid = self.ensure_directory()?;
        let dir_frame = self.buffer_pool.fetch_page(dir_pid)?;
        let mut dir_data = dir_frame.page_mut();
        let mut dir = HashTableDirectoryPage::attach(dir_data.as_mut_slice());

        let slot = self.hasher.hash_key(key) & dir.global_depth_mask();
        let depth = dir.local_depth(slot);
        if depth == 0 {
            drop(dir);
            drop(dir_data);
            self.buffer_pool.unpin_page(dir_pid, false);
            return Ok(());
        }

        let image = dir.get_split_image_index(slot);
        let dead_pid = dir.bucket_page_id(slot);
        let image_pid = dir.bucket_page_id(image);
        if dir.local_depth(image) != depth || dead_pid == image_pid {
            drop(dir);
            drop(dir_data);
            self.buffer_pool.unpin_page(dir_pid, false);
            return Ok(());
        }

        // Point the dead bucket's slots at the image and drop the merged
        // pair one depth level.
        for j in 0..dir.size() {
            let pid = dir.bucket_page_id(j);
            if pid == dead_pid {
                dir.set_bucket_page_id(j, image_pid);
                dir.set_local_depth(j, depth - 1);
            } else if pid == image_pid {
                dir.set_local_depth(j, depth - 1);
            }
        }

        while dir.can_shrink() {
            dir.decr_global_depth();
        }

        drop(dir);
        drop(dir_data);
        self.buffer_pool.unpin_page(dir_pid, true);

        // All directory references are gone; release the page itself.
        self.buffer_pool.delete_page(dead_pid);
        Ok(())
    }
}
