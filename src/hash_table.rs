//! HashTable: separate chaining over `ChainBucket`s with prime-sized growth.
//!
//! The slot count always comes from `PRIMES`. Before an insert that would
//! add an entry, the table grows one step if `(len + 1) / slots >= 0.75`,
//! moving every entry into the bucket chosen by its hash under the new slot
//! count. After the last prime the table stops growing and reports
//! `GrowthStatus::Exhausted`.

use crate::chain_bucket::{self, ChainBucket};
use crate::map::{DuplicatePolicy, InsertError, KeyValueMap};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, warn};

/// Slot counts the table moves through, each a prime close to a power of two.
pub const PRIMES: [usize; 27] = [
    31, 61, 127, 251, 509, 1021, 2039, 4093, 8191, 16381, 32749, 65521, 131071, 262139, 524287,
    1048573, 2097143, 4194301, 8388593, 16777213, 33554393, 67108859, 134217689, 268435399,
    536870909, 1073741789, 2147483647,
];

// Growth threshold 3/4, compared in integers.
const LOAD_NUM: usize = 3;
const LOAD_DEN: usize = 4;

/// Whether the table can still grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStatus {
    Growing,
    /// The largest prime is in use; the load factor may now exceed 0.75.
    Exhausted,
}

pub struct HashTable<K, V, S = DefaultHashBuilder> {
    pub(crate) hasher: S,
    pub(crate) slots: Vec<ChainBucket<K, V>>,
    len: usize,
    growth_index: usize,
    policy: DuplicatePolicy,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self::with_hasher_and_policy(Default::default(), policy)
    }

    /// Starts at the smallest prime in `PRIMES` that is at least `slots`
    /// (the largest prime if none is).
    pub fn with_initial_slots(slots: usize) -> Self {
        let mut table = Self::new();
        let growth_index = PRIMES
            .iter()
            .position(|&p| p >= slots)
            .unwrap_or(PRIMES.len() - 1);
        table.growth_index = growth_index;
        table.slots = empty_slots(PRIMES[growth_index]);
        table
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

fn empty_slots<K, V>(count: usize) -> Vec<ChainBucket<K, V>> {
    (0..count).map(|_| ChainBucket::new()).collect()
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_policy(hasher, DuplicatePolicy::default())
    }

    pub fn with_hasher_and_policy(hasher: S, policy: DuplicatePolicy) -> Self {
        Self {
            hasher,
            slots: empty_slots(PRIMES[0]),
            len: 0,
            growth_index: 0,
            policy,
        }
    }

    fn slot_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        slot_index(self.hasher.hash_one(q), self.slots.len())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.slots.len() as f64
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn growth_status(&self) -> GrowthStatus {
        if self.growth_index + 1 < PRIMES.len() {
            GrowthStatus::Growing
        } else {
            GrowthStatus::Exhausted
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.slots[self.slot_of(q)].get(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.slot_of(q);
        self.slots[slot].get_mut(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).is_some()
    }

    /// Inserts `key`. A fresh key returns `Ok(None)`; an existing key is
    /// resolved by the table's `DuplicatePolicy` and never triggers growth.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        let slot = self.slot_of(&key);
        if let Some(stored) = self.slots[slot].get_mut(&key) {
            return self.policy.resolve(stored, value);
        }

        let needs_growth =
            (self.len + 1).saturating_mul(LOAD_DEN) >= self.slots.len().saturating_mul(LOAD_NUM);
        let slot = if needs_growth && self.grow() {
            self.slot_of(&key)
        } else {
            slot
        };
        self.slots[slot].insert(key, value)?;
        self.len += 1;
        Ok(None)
    }

    /// Removes `key`; the entry count only drops when something was removed.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.slot_of(q);
        let value = self.slots[slot].remove(q)?;
        self.len -= 1;
        Some(value)
    }

    /// Moves to the next prime and rehashes every entry. Returns false when
    /// the sequence is exhausted.
    fn grow(&mut self) -> bool {
        let Some(&next) = PRIMES.get(self.growth_index + 1) else {
            return false;
        };
        let prev = self.slots.len();
        let mut fresh = empty_slots(next);
        for bucket in core::mem::take(&mut self.slots) {
            for (k, v) in bucket {
                let slot = slot_index(self.hasher.hash_one(&k), next);
                fresh[slot].push_back(k, v);
            }
        }
        self.slots = fresh;
        self.growth_index += 1;
        debug!(
            "hash table grew from {} to {} slots with {} entries",
            prev, next, self.len
        );
        if self.growth_status() == GrowthStatus::Exhausted {
            warn!(
                "hash table reached its largest slot count ({}); load factor is no longer bounded",
                next
            );
        }
        true
    }

    /// Entries in bucket order, then chain order within a bucket.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            current: None,
            remaining: self.len,
        }
    }

    /// Non-empty buckets in slot order.
    pub fn buckets(&self) -> impl Iterator<Item = &ChainBucket<K, V>> + '_ {
        self.slots.iter().filter(|b| !b.is_empty())
    }
}

fn slot_index(hash: u64, slot_count: usize) -> usize {
    // slot_count <= PRIMES[26] < 2^31, so the remainder fits in usize.
    (hash % slot_count as u64) as usize
}

/// Iterator over a table's entries in bucket-then-chain order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, ChainBucket<K, V>>,
    current: Option<chain_bucket::Iter<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some(item);
            }
            self.current = Some(self.slots.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> fmt::Debug for HashTable<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> KeyValueMap<K, V> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        HashTable::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        HashTable::get(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        HashTable::remove(self, key)
    }

    fn len(&self) -> usize {
        HashTable::len(self)
    }
}
