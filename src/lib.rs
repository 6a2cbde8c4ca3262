//! assoc-maps: generic key-value containers with one shared contract.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an ordered map that stays height-balanced under any sequence of
//!   inserts and removes, and a chaining hash table whose slot array grows
//!   along a fixed sequence of primes.
//! - Containers:
//!   - AvlMap<K, V>: AVL tree over a `SlotMap` arena. Every node caches its
//!     height, subtree size and balance factor; insert/remove recompute them
//!     on the way back up and rotate where a balance factor reaches ±2.
//!   - BstMap<K, V>: the same contract with no rebalancing. Kept as the
//!     baseline the AVL map is measured against.
//!   - HashTable<K, V, S>: a `Vec` of `ChainBucket`s. Grows one prime step
//!     before an insert that would push the load factor to 0.75, moving
//!     every entry to the bucket chosen by its hash under the new count.
//!   - ChainBucket<K, V>: singly-linked chain for one slot; appends new keys
//!     at the tail and rejects duplicates.
//!
//! Duplicate keys
//! - Every container takes a `DuplicatePolicy`. `Reject` (the default)
//!   returns `Err(InsertError::DuplicateKey)` and keeps the stored value;
//!   `Upsert` replaces the value and returns the old one. No container
//!   swallows a duplicate silently.
//!
//! Counting
//! - `len()` is O(1) everywhere: the trees read the root's cached subtree
//!   size, the table keeps an entry counter. Removing an absent key never
//!   changes it.
//!
//! Growth
//! - Slot counts run 31, 61, 127, ... 2147483647. After the last prime the
//!   table keeps accepting entries and reports `GrowthStatus::Exhausted`; a
//!   warning is logged through `log` when that happens, growth events are
//!   logged at debug level.
//!
//! Concurrency
//! - Single-threaded and synchronous. Mutation takes `&mut self`; nothing is
//!   locked internally. The containers are `Send`/`Sync` whenever their keys,
//!   values and hasher are, so sharing across threads means wrapping them in
//!   a `Mutex` (or similar) held by the caller.
//!
//! Non-goals
//! - No serialization, no iteration order beyond each structure's natural
//!   traversal (key order for the trees, bucket-then-chain order for the
//!   table), no comparator other than `Ord` / `BuildHasher`.
//!
//! ```
//! use assoc_maps::{AvlMap, DuplicatePolicy, HashTable, InsertError, KeyValueMap};
//!
//! let mut tree = AvlMap::new();
//! for k in 1..=7 {
//!     tree.insert(k, k * 10).unwrap();
//! }
//! assert_eq!(tree.height(), Some(2));
//! assert_eq!(tree.insert(3, 0), Err(InsertError::DuplicateKey));
//!
//! let mut table = HashTable::with_policy(DuplicatePolicy::Upsert);
//! table.insert("a", 1).unwrap();
//! assert_eq!(table.insert("a", 2), Ok(Some(1)));
//!
//! fn total<M: KeyValueMap<i32, i32>>(m: &M, keys: &[i32]) -> i32 {
//!     keys.iter().filter_map(|k| m.get(k)).sum()
//! }
//! assert_eq!(total(&tree, &[1, 2, 99]), 30);
//! ```

mod avl_map;
mod avl_map_proptest;
mod bst_map;
pub mod chain_bucket;
pub mod hash_table;
mod hash_table_proptest;
mod map;

// Public surface
pub use avl_map::AvlMap;
pub use bst_map::BstMap;
pub use chain_bucket::ChainBucket;
pub use hash_table::{GrowthStatus, HashTable, PRIMES};
pub use map::{DuplicatePolicy, InsertError, KeyValueMap};

pub mod iter {
    //! Iterator types returned by the containers.
    pub use crate::avl_map::{Iter as AvlIter, LevelOrder as AvlLevelOrder};
    pub use crate::bst_map::Iter as BstIter;
    pub use crate::chain_bucket::{IntoIter as BucketIntoIter, Iter as BucketIter};
    pub use crate::hash_table::Iter as HashTableIter;
}
