//! Page identifier type.

use std::fmt;

/// Identifies a page on disk.
///
/// Page ids are minted by the buffer pool's sharded counters, not by the
/// disk manager: instance `i` of an `n`-instance pool hands out the ids
/// congruent to `i` modulo `n`, and [`shard`](PageId::shard) recovers
/// that residue to route any id back to its owner. The id doubles as the
/// page's location: byte offset `id × PAGE_SIZE` in the database file.
///
/// Hash directory slots persist page ids little-endian via
/// [`to_le_bytes`](PageId::to_le_bytes) / [`from_le_bytes`](PageId::from_le_bytes).
///
/// # Example
/// ```
/// use hearthdb::PageId;
///
/// // a 4-way parallel pool hands instance 3 the ids 3, 7, 11, …
/// let pid = PageId::new(7);
/// assert_eq!(pid.shard(4), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel for "no page": the bit pattern of a -1 page id.
    ///
    /// A hash table starts with `directory_page_id` set to this until the
    /// first operation allocates the directory.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Which of `num_instances` buffer pool instances owns this page.
    ///
    /// Well-defined because the sharded allocators only ever mint ids
    /// with their own residue.
    #[inline]
    pub fn shard(&self, num_instances: u32) -> u32 {
        self.0 % num_instances
    }

    /// On-disk form: four little-endian bytes, as stored in a hash
    /// directory slot.
    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Decode the on-disk form.
    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PageId(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
