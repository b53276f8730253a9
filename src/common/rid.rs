//! Record identifier type.

use std::fmt;

use crate::common::PageId;

/// Identifies a record: the page it lives on plus its slot within that page.
///
/// This is the value type stored by the hash index for the generic-key
/// instantiations: an index entry maps a key to the location of its tuple.
/// Encoded as 8 bytes (two little-endian u32s) inside index pages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    /// Page holding the record.
    pub page_id: u32,
    /// Slot number within the page.
    pub slot: u32,
}

impl Rid {
    /// Create a new Rid.
    #[inline]
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self {
            page_id: page_id.0,
            slot,
        }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}, {})", self.page_id, self.slot)
    }
}
