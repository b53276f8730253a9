//! Frame identifier type.

/// Index of a slot in a buffer pool instance's frame array.
///
/// Unlike a [`PageId`](crate::common::PageId), a frame id never leaves
/// the process or the instance that coined it: it is position, not
/// identity. The pool resolves `page_table[page_id]` to a `FrameId` and
/// indexes `frames[frame_id.0]`; the replacer keys its eviction order by
/// it. `usize` so the indexing needs no casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }
}
