//! Transactions and locking.
//!
//! Only the interface lives here: the storage core threads an opaque
//! [`Transaction`] through index operations, and the [`LockManager`]
//! stub grants every request. Real two-phase locking is out of scope.

mod lock_manager;
mod transaction;

pub use lock_manager::LockManager;
pub use transaction::Transaction;
