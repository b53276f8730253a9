//! Index structures.
//!
//! - [`key`] - key/value codecs, comparators and hash functions
//! - [`ExtendibleHashTable`] - disk-resident extendible hash index

mod extendible_hash_table;
pub mod key;

pub use extendible_hash_table::ExtendibleHashTable;
