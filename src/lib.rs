//! HearthDB - the storage-and-indexing core of an educational relational
//! database engine.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          HearthDB core                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │            Index Layer (index/)                         │  │
//! │  │   ExtendibleHashTable: directory page + bucket pages    │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↓                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │            Buffer Pool (buffer/)                        │  │
//! │  │   ParallelBufferPool → BufferPoolInstance shards        │  │
//! │  │   Frame pinning + LruReplacer eviction + Stats          │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↓                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │            Storage Layer (storage/)                     │  │
//! │  │   DiskManager + Page + hash table page formats          │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Query execution, planning, the catalog, write-ahead logging and full
//! transaction isolation are collaborators outside this crate; only their
//! touch points ([`Transaction`], the [`concurrency::LockManager`] stub)
//! live here.
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Rid, Error, config)
//! - [`storage`] - Disk I/O and page formats
//! - [`buffer`] - Buffer pool management and eviction
//! - [`index`] - The extendible hash index
//! - [`concurrency`] - Transaction handle and lock manager stub
//!
//! # Quick Start
//! ```no_run
//! use hearthdb::buffer::{BufferPool, BufferPoolInstance};
//! use hearthdb::storage::DiskManager;
//!
//! let dm = DiskManager::create("my_database.db").unwrap();
//! let bpm = BufferPoolInstance::new(64, dm);
//!
//! let (page_id, frame) = bpm.new_page().unwrap();
//! frame.page_mut().as_mut_slice()[0] = 0xAB;
//! bpm.unpin_page(page_id, true);
//! ```

pub mod buffer;
pub mod common;
pub mod concurrency;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, PageId, Result, Rid};

pub use buffer::{BufferPool, BufferPoolInstance, Frame, ParallelBufferPool};
pub use concurrency::Transaction;
pub use index::ExtendibleHashTable;
pub use storage::page::Page;
pub use storage::DiskManager;
