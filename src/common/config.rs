//! Configuration constants for HearthDB.

/// Size of a page in bytes (4KB).
///
/// Every layer is sized off this single constant: a frame buffers
/// exactly one page, the disk manager seeks in `PAGE_SIZE` strides
/// (page `n` lives at byte offset `n × PAGE_SIZE`), and the hash
/// table's bucket capacity and directory array are derived so each
/// format fills one page without overflowing it.
pub const PAGE_SIZE: usize = 4096;
