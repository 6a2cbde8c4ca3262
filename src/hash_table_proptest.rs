#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can compare the
// slot array against the growth rule directly.

use crate::chain_bucket::ChainBucket;
use crate::hash_table::{HashTable, PRIMES};
use crate::map::{DuplicatePolicy, InsertError};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i32),
    Remove(u32),
    Get(u32),
    Iterate,
}

fn arb_ops(key_space: u32) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        4 => (0..key_space, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (0..key_space).prop_map(Op::Remove),
        1 => (0..key_space).prop_map(Op::Get),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..400)
}

/// Advances the expected prime index for one fresh insert into a table that
/// held `len_before_insert` entries.
fn expected_growth(index: &mut usize, len_before_insert: usize) {
    if (len_before_insert + 1) * 4 >= PRIMES[*index] * 3 && *index + 1 < PRIMES.len() {
        *index += 1;
    }
}

fn check_table<K, V, S>(t: &HashTable<K, V, S>, expected_index: usize)
where
    K: Eq + core::hash::Hash,
    S: BuildHasher,
{
    assert_eq!(t.slot_count(), PRIMES[expected_index]);
    let total: usize = t.slots.iter().map(ChainBucket::len).sum();
    assert_eq!(total, t.len());
    // Each entry sits in the bucket its hash selects.
    for (i, bucket) in t.slots.iter().enumerate() {
        for (k, _) in bucket.iter() {
            assert_eq!((t.hasher.hash_one(k) % t.slot_count() as u64) as usize, i);
        }
    }
}

fn run_state_machine<S: BuildHasher>(
    mut sut: HashTable<u32, i32, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u32, i32> = HashMap::new();
    let mut expected_index = 0;

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let already = model.contains_key(&k);
                match sut.insert(k, v) {
                    Ok(prev) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert_eq!(prev, None);
                        expected_growth(&mut expected_index, model.len());
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                }
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            Op::Iterate => {
                let mut seen: Vec<_> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                let mut expected: Vec<_> = model.iter().map(|(k, v)| (*k, *v)).collect();
                seen.sort_unstable();
                expected.sort_unstable();
                prop_assert_eq!(seen, expected);
            }
        }
        check_table(&sut, expected_index);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - Duplicate inserts error and never count as entries.
// - Removing an absent key leaves len alone.
// - The slot count follows the growth rule; every entry stays in the bucket
//   its hash selects and bucket lengths sum to len.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_table_state_machine(ops in arb_ops(256)) {
        run_state_machine(HashTable::new(), ops)?;
    }
}

// Collision variant using a constant hasher: every entry shares one chain.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants under worst-case collisions, which stresses
// chain unlinking at head, middle and tail.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_table_state_machine_with_collisions(ops in arb_ops(48)) {
        run_state_machine(HashTable::with_hasher(ConstBuildHasher), ops)?;
    }
}

// Property: Upsert behaves like HashMap::insert.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_table_upsert_matches_hashmap(ops in arb_ops(128)) {
        let mut sut: HashTable<u32, i32> = HashTable::with_policy(DuplicatePolicy::Upsert);
        let mut model: HashMap<u32, i32> = HashMap::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => prop_assert_eq!(sut.insert(k, v), Ok(model.insert(k, v))),
                Op::Remove(k) => prop_assert_eq!(sut.remove(&k), model.remove(&k)),
                Op::Get(k) => prop_assert_eq!(sut.get(&k), model.get(&k)),
                Op::Iterate => prop_assert_eq!(sut.iter().count(), model.len()),
            }
        }
        prop_assert_eq!(sut.len(), model.len());
    }
}

// Property: n distinct inserts into a fresh table end at the prime the growth
// rule predicts, with every key retrievable.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_matches_rule(n in 0usize..3000) {
        let mut sut: HashTable<usize, usize> = HashTable::new();
        let mut expected_index = 0;
        for i in 0..n {
            expected_growth(&mut expected_index, i);
            sut.insert(i, i).unwrap();
        }
        prop_assert_eq!(sut.slot_count(), PRIMES[expected_index]);
        prop_assert!(n == 0 || (n as f64) / (sut.slot_count() as f64) < 0.75);
        for i in 0..n {
            prop_assert_eq!(sut.get(&i), Some(&i));
        }
    }
}
