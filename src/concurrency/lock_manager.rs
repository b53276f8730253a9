//! Lock manager stub.
//!
//! Full two-phase locking (request queues, blocking grants, deadlock
//! detection) is a separate design. This stub maintains per-transaction
//! lock sets and grants every request immediately so executors can be
//! written against the final interface.

use crate::common::Rid;
use crate::concurrency::Transaction;

/// Grants record locks to transactions.
#[derive(Debug, Default)]
pub struct LockManager;

impl LockManager {
    pub fn new() -> Self {
        Self
    }

    /// Acquire a shared lock on `rid`. Always granted.
    pub fn lock_shared(&self, txn: &Transaction, rid: Rid) -> bool {
        if txn.is_shared_locked(&rid) || txn.is_exclusive_locked(&rid) {
            return true;
        }
        txn.add_shared_lock(rid);
        true
    }

    /// Acquire an exclusive lock on `rid`. Always granted.
    pub fn lock_exclusive(&self, txn: &Transaction, rid: Rid) -> bool {
        if txn.is_exclusive_locked(&rid) {
            return true;
        }
        txn.add_exclusive_lock(rid);
        true
    }

    /// Upgrade a held shared lock to exclusive. Always granted.
    pub fn lock_upgrade(&self, txn: &Transaction, rid: Rid) -> bool {
        txn.remove_shared_lock(&rid);
        txn.add_exclusive_lock(rid);
        true
    }

    /// Release whatever lock `txn` holds on `rid`.
    pub fn unlock(&self, txn: &Transaction, rid: Rid) -> bool {
        txn.remove_shared_lock(&rid);
        txn.remove_exclusive_lock(&rid);
        true
    }
}
