//! Directory page for the extendible hash table.
//!
//! # Layout
//! ```text
//! Offset  Size   Field
//! ------  ----   -----
//! 0       4      page_id (little-endian u32)
//! 4       4      global_depth (little-endian u32)
//! 8       512    local_depths (one byte per slot)
//! 520     2048   bucket_page_ids (little-endian u32 per slot)
//! ```
//!
//! The used prefix of the arrays is `2^global_depth` slots. Structural
//! invariants (checked by [`verify_integrity`](HashTableDirectoryPage::verify_integrity)):
//!
//! - `global_depth <= MAX_GLOBAL_DEPTH`
//! - every used slot's local depth <= global depth
//! - slots sharing a bucket page share its local depth
//! - a bucket of local depth `d` is referenced by exactly
//!   `2^(global_depth - d)` slots
//!
//! Like the bucket page, this is a latch-free view over a frame's bytes.

use crate::common::PageId;
use crate::storage::page::hash_table_page_defs::{DIRECTORY_ARRAY_SIZE, MAX_GLOBAL_DEPTH};

const PAGE_ID_OFFSET: usize = 0;
const GLOBAL_DEPTH_OFFSET: usize = 4;
const LOCAL_DEPTHS_OFFSET: usize = 8;
const BUCKET_PAGE_IDS_OFFSET: usize = LOCAL_DEPTHS_OFFSET + DIRECTORY_ARRAY_SIZE;
const DIRECTORY_PAGE_SIZE: usize = BUCKET_PAGE_IDS_OFFSET + 4 * DIRECTORY_ARRAY_SIZE;

/// Typed view of the directory page's bytes.
pub struct HashTableDirectoryPage<'a> {
    data: &'a mut [u8],
}

impl<'a> HashTableDirectoryPage<'a> {
    /// Interpret `data` (a full page) as a directory page.
    pub fn attach(data: &'a mut [u8]) -> Self {
        debug_assert!(data.len() >= DIRECTORY_PAGE_SIZE);
        Self { data }
    }

    // ========================================================================
    // Header fields
    // ========================================================================

    /// Page id recorded inside the page itself.
    pub fn page_id(&self) -> PageId {
        self.read_page_id(PAGE_ID_OFFSET)
    }

    pub fn set_page_id(&mut self, page_id: PageId) {
        self.write_page_id(PAGE_ID_OFFSET, page_id);
    }

    /// Number of hash bits the directory currently resolves.
    pub fn global_depth(&self) -> u32 {
        self.read_u32(GLOBAL_DEPTH_OFFSET)
    }

    /// Mask selecting the `global_depth` low bits of a hash.
    pub fn global_depth_mask(&self) -> u32 {
        (1 << self.global_depth()) - 1
    }

    /// Number of used directory slots: `2^global_depth`.
    pub fn size(&self) -> u32 {
        1 << self.global_depth()
    }

    // ========================================================================
    // Slot accessors
    // ========================================================================

    /// Bucket page referenced by `slot`.
    pub fn bucket_page_id(&self, slot: u32) -> PageId {
        self.read_page_id(BUCKET_PAGE_IDS_OFFSET + 4 * slot as usize)
    }

    pub fn set_bucket_page_id(&mut self, slot: u32, bucket_page_id: PageId) {
        self.write_page_id(BUCKET_PAGE_IDS_OFFSET + 4 * slot as usize, bucket_page_id);
    }

    /// Number of hash bits the bucket referenced by `slot` resolves.
    pub fn local_depth(&self, slot: u32) -> u32 {
        self.data[LOCAL_DEPTHS_OFFSET + slot as usize] as u32
    }

    pub fn set_local_depth(&mut self, slot: u32, local_depth: u32) {
        debug_assert!(local_depth <= MAX_GLOBAL_DEPTH);
        self.data[LOCAL_DEPTHS_OFFSET + slot as usize] = local_depth as u8;
    }

    pub fn incr_local_depth(&mut self, slot: u32) {
        self.set_local_depth(slot, self.local_depth(slot) + 1);
    }

    pub fn decr_local_depth(&mut self, slot: u32) {
        self.set_local_depth(slot, self.local_depth(slot) - 1);
    }

    /// Mask selecting the `local_depth(slot)` low bits of a hash.
    pub fn local_depth_mask(&self, slot: u32) -> u32 {
        (1 << self.local_depth(slot)) - 1
    }

    /// The slot paired with `slot` one depth level down: `slot` with its
    /// highest locally-resolved bit flipped. Callers compute this after
    /// incrementing the bucket's local depth to `d`, so the formula flips
    /// bit `d - 1`.
    pub fn get_split_image_index(&self, slot: u32) -> u32 {
        slot ^ (1 << (self.local_depth(slot) - 1))
    }

    // ========================================================================
    // Growth and shrinkage
    // ========================================================================

    /// Double the directory.
    ///
    /// The new upper half `[2^g, 2^(g+1))` mirrors the lower half: each new
    /// slot receives the bucket page id and local depth of the slot
    /// `2^g` below it, so every slot keeps pointing at a valid bucket.
    ///
    /// # Panics
    /// Panics if the directory is already at `MAX_GLOBAL_DEPTH`.
    pub fn incr_global_depth(&mut self) {
        let old_size = self.size();
        assert!(
            self.global_depth() < MAX_GLOBAL_DEPTH,
            "directory cannot grow past MAX_GLOBAL_DEPTH"
        );

        for slot in 0..old_size {
            let mirror = old_size + slot;
            let pid = self.bucket_page_id(slot);
            let depth = self.local_depth(slot);
            self.set_bucket_page_id(mirror, pid);
            self.set_local_depth(mirror, depth);
        }

        self.write_u32(GLOBAL_DEPTH_OFFSET, self.global_depth() + 1);
    }

    /// Halve the directory.
    ///
    /// # Panics
    /// Panics unless [`can_shrink`](Self::can_shrink) holds.
    pub fn decr_global_depth(&mut self) {
        assert!(self.can_shrink(), "directory cannot shrink");
        self.write_u32(GLOBAL_DEPTH_OFFSET, self.global_depth() - 1);
    }

    /// Whether the directory can halve: every used slot's local depth must
    /// be strictly below the global depth.
    pub fn can_shrink(&self) -> bool {
        let global_depth = self.global_depth();
        if global_depth == 0 {
            return false;
        }
        (0..self.size()).all(|slot| self.local_depth(slot) < global_depth)
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Assert the extendible-hashing invariants.
    ///
    /// # Panics
    /// Panics on the first violated invariant. Violations are not
    /// self-healing; the caller is expected to abort.
    pub fn verify_integrity(&self) {
        use std::collections::HashMap;

        let global_depth = self.global_depth();
        assert!(
            global_depth <= MAX_GLOBAL_DEPTH,
            "global depth {} exceeds maximum {}",
            global_depth,
            MAX_GLOBAL_DEPTH
        );

        // bucket page id -> (reference count, local depth)
        let mut buckets: HashMap<PageId, (u32, u32)> = HashMap::new();

        for slot in 0..self.size() {
            let local_depth = self.local_depth(slot);
            assert!(
                local_depth <= global_depth,
                "slot {}: local depth {} exceeds global depth {}",
                slot,
                local_depth,
                global_depth
            );

            let pid = self.bucket_page_id(slot);
            assert!(pid.is_valid(), "slot {}: invalid bucket page id", slot);

            let entry = buckets.entry(pid).or_insert((0, local_depth));
            assert_eq!(
                entry.1, local_depth,
                "bucket {} referenced with differing local depths",
                pid
            );
            entry.0 += 1;
        }

        for (pid, (count, local_depth)) in buckets {
            let expected = 1u32 << (global_depth - local_depth);
            assert_eq!(
                count, expected,
                "bucket {} (local depth {}) has {} directory references, expected {}",
                pid, local_depth, count, expected
            );
        }
    }

    // ========================================================================
    // Raw field access
    // ========================================================================

    fn read_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn read_page_id(&self, offset: usize) -> PageId {
        PageId::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    fn write_page_id(&mut self, offset: usize, page_id: PageId) {
        self.data[offset..offset + 4].copy_from_slice(&page_id.to_le_bytes());
    }
}
