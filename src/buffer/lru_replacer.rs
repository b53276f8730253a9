//! LRU (Least Recently Used) replacement policy.
//!
//! The replacer tracks the frames that are resident and unpinned, in the
//! order their pin counts last dropped to zero. The victim is always the
//! frame whose `unpin` is oldest among frames still present.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::common::FrameId;

/// Tracks evictable frames in least-recently-used order.
///
/// Backed by [`lru::LruCache`] (hash map + doubly-linked list), so
/// `victim`, `pin` and `unpin` are all O(1).
///
/// The buffer pool instance drives it from behind its own latch:
/// - `unpin(f)` when frame `f`'s pin count reaches 0
/// - `pin(f)` when frame `f`'s pin count leaves 0 (or the frame is deleted)
/// - `victim()` when eviction needs a frame
pub struct LruReplacer {
    entries: LruCache<FrameId, ()>,
}

impl LruReplacer {
    /// Create a replacer with capacity for `num_pages` frames (the pool
    /// size; the replacer never holds more frames than exist).
    pub fn new(num_pages: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(num_pages).expect("replacer capacity must be > 0")),
        }
    }

    /// Remove and return the least-recently-unpinned frame.
    ///
    /// Returns None iff the replacer is empty (every frame pinned or free).
    pub fn victim(&mut self) -> Option<FrameId> {
        self.entries.pop_lru().map(|(frame_id, ())| frame_id)
    }

    /// Remove `frame_id` from the replacer if present; no-op otherwise.
    pub fn pin(&mut self, frame_id: FrameId) {
        self.entries.pop(&frame_id);
    }

    /// Insert `frame_id` as most-recently-used if absent; no-op if already
    /// present (a redundant unpin must not refresh recency).
    pub fn unpin(&mut self, frame_id: FrameId) {
        if !self.entries.contains(&frame_id) {
            self.entries.put(frame_id, ());
        }
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_victim_in_unpin_order() {
        let mut replacer = LruReplacer::new(7);

        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));
        replacer.unpin(FrameId::new(3));
        assert_eq!(replacer.size(), 3);

        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), Some(FrameId::new(3)));
        assert_eq!(replacer.victim(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_pin_removes_from_replacer() {
        let mut replacer = LruReplacer::new(7);

        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));

        replacer.pin(FrameId::new(1));
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));

        // pinning an absent frame is a no-op
        replacer.pin(FrameId::new(9));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_redundant_unpin_keeps_order() {
        let mut replacer = LruReplacer::new(7);

        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));
        // second unpin of frame 1 must not refresh its recency
        replacer.unpin(FrameId::new(1));

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
    }

    #[test]
    fn test_reinsert_after_pin_is_mru() {
        let mut replacer = LruReplacer::new(7);

        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));
        replacer.pin(FrameId::new(1));
        replacer.unpin(FrameId::new(1));

        // frame 1 was re-unpinned after frame 2: 2 is now the victim
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
    }
}
