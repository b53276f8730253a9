//! Extendible hash table scenario tests.
//!
//! Split and merge behavior is steered with the identity hash (keys map
//! to themselves, so their low bits choose the directory slot); the
//! mixed-workload tests run the default hash.

use std::sync::Arc;

use hearthdb::buffer::{BufferPoolInstance, ParallelBufferPool};
use hearthdb::index::key::{
    DefaultKeyHasher, GenericComparator, GenericKey, IdentityHasher, IntComparator,
};
use hearthdb::storage::page::hash_table_page_defs::bucket_array_size;
use hearthdb::storage::DiskManager;
use hearthdb::{ExtendibleHashTable, Rid, Transaction};
use rand::seq::SliceRandom;
use rand::SeedableRng;

type IntTable = ExtendibleHashTable<i32, i32, IntComparator, IdentityHasher>;
type HashedTable = ExtendibleHashTable<i32, i32, IntComparator, DefaultKeyHasher>;

const BUCKET_CAPACITY: usize = bucket_array_size::<i32, i32>();

fn create_int_table(pool_size: usize) -> (IntTable, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("test.db")).unwrap();
    let bpm = Arc::new(BufferPoolInstance::new(pool_size, dm));
    (
        ExtendibleHashTable::new(bpm, IntComparator::new(), IdentityHasher),
        dir,
    )
}

fn create_hashed_table(pool_size: usize) -> (HashedTable, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("test.db")).unwrap();
    let bpm = Arc::new(BufferPoolInstance::new(pool_size, dm));
    (
        ExtendibleHashTable::new(bpm, IntComparator::new(), DefaultKeyHasher),
        dir,
    )
}

// ============================================================================
// Split behavior
// ============================================================================

/// Overfilling one bucket with keys that share their low bit forces the
/// directory to grow; the overflowing insert then succeeds.
#[test]
fn test_bucket_split_grows_directory() {
    let (table, _dir) = create_int_table(16);
    let txn = Transaction::new(0);

    // Keys 0, 2, 4, …: all even, so depth 1 cannot separate them.
    let keys: Vec<i32> = (0..BUCKET_CAPACITY as i32).map(|i| 2 * i).collect();
    for &key in &keys {
        assert!(table.insert(&txn, &key, &key).unwrap());
    }
    assert_eq!(table.global_depth().unwrap(), 0);

    // The next even key overflows the bucket. One split (depth 1) leaves
    // every key together, so the table must split again to depth 2.
    let overflow = 2 * BUCKET_CAPACITY as i32;
    assert!(table.insert(&txn, &overflow, &overflow).unwrap());
    assert_eq!(table.global_depth().unwrap(), 2);
    table.verify_integrity().unwrap();

    // Every key is still reachable.
    for &key in keys.iter().chain(std::iter::once(&overflow)) {
        assert_eq!(table.get_value(&txn, &key).unwrap(), vec![key]);
    }
}

/// A split at maximum depth fails the insert instead of growing.
#[test]
fn test_insert_fails_at_max_depth() {
    let (table, _dir) = create_int_table(16);
    let txn = Transaction::new(0);

    // Multiples of 512 share their low 9 bits; no reachable depth
    // (max 9) can ever separate them.
    for i in 0..BUCKET_CAPACITY as i32 {
        let key = i * 512;
        assert!(table.insert(&txn, &key, &i).unwrap());
    }

    let overflow = (BUCKET_CAPACITY as i32) * 512;
    assert!(!table.insert(&txn, &overflow, &overflow).unwrap());

    // The chain of futile splits grew the directory all the way down,
    // but the failed insert left no entry behind.
    assert_eq!(table.global_depth().unwrap(), 9);
    table.verify_integrity().unwrap();
    assert!(table.get_value(&txn, &overflow).unwrap().is_empty());
}

// ============================================================================
// Duplicate handling
// ============================================================================

#[test]
fn test_duplicate_pair_rejected() {
    let (table, _dir) = create_int_table(16);
    let txn = Transaction::new(0);

    assert!(table.insert(&txn, &7, &70).unwrap());
    assert!(!table.insert(&txn, &7, &70).unwrap());
    assert_eq!(table.get_value(&txn, &7).unwrap(), vec![70]);

    // Same key, different value: allowed.
    assert!(table.insert(&txn, &7, &71).unwrap());
    let mut values = table.get_value(&txn, &7).unwrap();
    values.sort();
    assert_eq!(values, vec![70, 71]);
}

// ============================================================================
// Merge behavior
// ============================================================================

/// Emptying one of a depth-1 pair collapses the directory back to depth 0.
#[test]
fn test_remove_and_merge_collapse() {
    let (table, _dir) = create_int_table(16);
    let txn = Transaction::new(0);

    // Mixed keys 0..=capacity: the overflow split separates evens from
    // odds at depth 1.
    let keys: Vec<i32> = (0..=BUCKET_CAPACITY as i32).collect();
    for &key in &keys {
        assert!(table.insert(&txn, &key, &(key * 10)).unwrap());
    }
    assert_eq!(table.global_depth().unwrap(), 1);
    table.verify_integrity().unwrap();

    // Drain the odd bucket; its last removal merges the pair and the
    // directory shrinks to depth 0.
    for key in keys.iter().filter(|k| *k % 2 == 1) {
        assert!(table.remove(&txn, key, &(key * 10)).unwrap());
    }
    assert_eq!(table.global_depth().unwrap(), 0);
    table.verify_integrity().unwrap();

    // The surviving keys still resolve.
    for key in keys.iter().filter(|k| *k % 2 == 0) {
        assert_eq!(table.get_value(&txn, key).unwrap(), vec![key * 10]);
    }
}

/// Removing a missing pair neither merges nor reports success.
#[test]
fn test_remove_missing_pair() {
    let (table, _dir) = create_int_table(16);
    let txn = Transaction::new(0);

    table.insert(&txn, &1, &10).unwrap();
    assert!(!table.remove(&txn, &1, &99).unwrap());
    assert!(!table.remove(&txn, &2, &10).unwrap());
    assert_eq!(table.get_value(&txn, &1).unwrap(), vec![10]);
}

// ============================================================================
// Round-trip under the default hash
// ============================================================================

/// Inserted pairs minus removed pairs is exactly what get_value sees.
#[test]
fn test_round_trip_multiset() {
    let (table, _dir) = create_hashed_table(32);
    let txn = Transaction::new(0);

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut keys: Vec<i32> = (0..1000).collect();
    keys.shuffle(&mut rng);

    for &key in &keys {
        assert!(table.insert(&txn, &key, &(key * 2)).unwrap());
        // every key also carries a second value
        assert!(table.insert(&txn, &key, &(key * 2 + 1)).unwrap());
    }
    table.verify_integrity().unwrap();

    for &key in &keys {
        let mut values = table.get_value(&txn, &key).unwrap();
        values.sort();
        assert_eq!(values, vec![key * 2, key * 2 + 1]);
    }

    // Remove one value per key; the other must survive.
    for &key in &keys {
        assert!(table.remove(&txn, &key, &(key * 2)).unwrap());
    }
    table.verify_integrity().unwrap();

    for &key in &keys {
        assert_eq!(table.get_value(&txn, &key).unwrap(), vec![key * 2 + 1]);
    }

    // Remove the rest; the table drains completely.
    for &key in &keys {
        assert!(table.remove(&txn, &key, &(key * 2 + 1)).unwrap());
        assert!(table.get_value(&txn, &key).unwrap().is_empty());
    }
    table.verify_integrity().unwrap();
}

/// The table stays correct with a buffer pool far smaller than its page
/// footprint (constant eviction traffic).
#[test]
fn test_survives_tiny_buffer_pool() {
    let (table, _dir) = create_hashed_table(4);
    let txn = Transaction::new(0);

    for key in 0..2000i32 {
        assert!(table.insert(&txn, &key, &key).unwrap());
    }
    table.verify_integrity().unwrap();

    for key in 0..2000i32 {
        assert_eq!(table.get_value(&txn, &key).unwrap(), vec![key]);
    }
}

// ============================================================================
// Generic keys over a parallel pool
// ============================================================================

#[test]
fn test_generic_keys_on_parallel_pool() {
    let dir = tempfile::tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("test.db")).unwrap();
    let pool = Arc::new(ParallelBufferPool::new(4, 8, dm));

    let table: ExtendibleHashTable<GenericKey<16>, Rid, GenericComparator<16>, DefaultKeyHasher> =
        ExtendibleHashTable::new(pool, GenericComparator::new(), DefaultKeyHasher);
    let txn = Transaction::new(0);

    for i in 0..500i64 {
        let key = GenericKey::<16>::from_integer(i);
        let rid = Rid {
            page_id: i as u32 / 10,
            slot: i as u32 % 10,
        };
        assert!(table.insert(&txn, &key, &rid).unwrap());
    }
    table.verify_integrity().unwrap();

    for i in 0..500i64 {
        let key = GenericKey::<16>::from_integer(i);
        let values = table.get_value(&txn, &key).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].page_id, i as u32 / 10);
        assert_eq!(values[0].slot, i as u32 % 10);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

/// Parallel writers over disjoint key ranges, then parallel readers.
#[test]
fn test_concurrent_insert_then_read() {
    use std::thread;

    let dir = tempfile::tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("test.db")).unwrap();
    let bpm = Arc::new(BufferPoolInstance::new(32, dm));
    let table: Arc<HashedTable> = Arc::new(ExtendibleHashTable::new(
        bpm,
        IntComparator::new(),
        DefaultKeyHasher,
    ));

    const PER_THREAD: i32 = 200;

    let mut writers = vec![];
    for t in 0..4i32 {
        let table = Arc::clone(&table);
        writers.push(thread::spawn(move || {
            let txn = Transaction::new(t as u64);
            for i in 0..PER_THREAD {
                let key = t * PER_THREAD + i;
                assert!(table.insert(&txn, &key, &key).unwrap());
            }
        }));
    }
    for writer in writers {
        writer.join().unwrap();
    }

    table.verify_integrity().unwrap();

    let mut readers = vec![];
    for t in 0..4i32 {
        let table = Arc::clone(&table);
        readers.push(thread::spawn(move || {
            let txn = Transaction::new(100 + t as u64);
            for i in 0..PER_THREAD {
                let key = t * PER_THREAD + i;
                assert_eq!(table.get_value(&txn, &key).unwrap(), vec![key]);
            }
        }));
    }
    for reader in readers {
        reader.join().unwrap();
    }
}

/// Interleaved inserts and removes from several threads leave exactly the
/// surviving half behind.
#[test]
fn test_concurrent_insert_remove() {
    use std::thread;

    let dir = tempfile::tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("test.db")).unwrap();
    let bpm = Arc::new(BufferPoolInstance::new(32, dm));
    let table: Arc<HashedTable> = Arc::new(ExtendibleHashTable::new(
        bpm,
        IntComparator::new(),
        DefaultKeyHasher,
    ));

    const PER_THREAD: i32 = 200;

    let mut handles = vec![];
    for t in 0..4i32 {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            let txn = Transaction::new(t as u64);
            for i in 0..PER_THREAD {
                let key = t * PER_THREAD + i;
                assert!(table.insert(&txn, &key, &key).unwrap());
                if key % 2 == 0 {
                    assert!(table.remove(&txn, &key, &key).unwrap());
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    table.verify_integrity().unwrap();

    let txn = Transaction::new(99);
    for key in 0..4 * PER_THREAD {
        let values = table.get_value(&txn, &key).unwrap();
        if key % 2 == 0 {
            assert!(values.is_empty(), "key {} should have been removed", key);
        } else {
            assert_eq!(values, vec![key], "key {} should have survived", key);
        }
    }
}
