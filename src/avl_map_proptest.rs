#![cfg(test)]

// Property tests for AvlMap kept inside the crate so they can inspect the
// arena and the cached per-node fields directly.

use crate::avl_map::{AvlMap, NodeKey};
use crate::map::{DuplicatePolicy, InsertError};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    Remove(u16),
    Get(u16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    // A narrow key range keeps duplicate inserts and hits on remove frequent.
    let key = 0u16..64;
    prop_oneof![
        3 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key.clone().prop_map(Op::Remove),
        1 => key.prop_map(Op::Get),
    ]
}

/// Recomputes every cached field bottom-up and checks it against the stored
/// one, along with the AVL and search-order invariants. Returns
/// `(height, size)` of the subtree.
fn check_subtree<K: Ord + Copy + core::fmt::Debug, V>(
    m: &AvlMap<K, V>,
    at: Option<NodeKey>,
    lo: Option<K>,
    hi: Option<K>,
) -> (i32, usize) {
    let Some(id) = at else {
        return (-1, 0);
    };
    let n = &m.nodes[id];
    if let Some(lo) = lo {
        assert!(lo < n.key, "order violated: {:?} not above {:?}", n.key, lo);
    }
    if let Some(hi) = hi {
        assert!(n.key < hi, "order violated: {:?} not below {:?}", n.key, hi);
    }
    let (hl, sl) = check_subtree(m, n.left, lo, Some(n.key));
    let (hr, sr) = check_subtree(m, n.right, Some(n.key), hi);
    let height = 1 + hl.max(hr);
    let size = 1 + sl + sr;
    assert_eq!(n.height, height, "stale height at {:?}", n.key);
    assert_eq!(n.size, size, "stale size at {:?}", n.key);
    assert_eq!(n.balance, hr - hl, "stale balance at {:?}", n.key);
    assert!((-1..=1).contains(&n.balance), "unbalanced at {:?}", n.key);
    (height, size)
}

fn check_tree<K: Ord + Copy + core::fmt::Debug, V>(m: &AvlMap<K, V>) {
    let (_, size) = check_subtree(m, m.root, None, None);
    assert_eq!(size, m.len());
    // Every node in the arena is reachable from the root.
    assert_eq!(m.nodes.len(), size);
}

// Property: state-machine equivalence against BTreeMap with the AVL
// invariants re-derived after every operation.
// - Reject policy: duplicate inserts error and keep the first value.
// - Remove of an absent key returns None and leaves len alone.
// - In-order iteration equals the model's ordered entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_avl_state_machine(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let mut sut: AvlMap<u16, i32> = AvlMap::new();
        let mut model: BTreeMap<u16, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let already = model.contains_key(&k);
                    match sut.insert(k, v) {
                        Ok(prev) => {
                            prop_assert!(!already, "insert must fail on duplicate");
                            prop_assert_eq!(prev, None);
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
            }
            check_tree(&sut);
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }

        let entries: Vec<_> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<_> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(entries, expected);
        for (i, (k, _)) in model.iter().enumerate() {
            prop_assert_eq!(sut.select(i).map(|(k, _)| *k), Some(*k));
            prop_assert_eq!(sut.rank(k), i);
        }
    }
}

// Property: under Upsert, the map behaves exactly like BTreeMap::insert.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_avl_upsert_matches_btreemap(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let mut sut: AvlMap<u16, i32> = AvlMap::with_policy(DuplicatePolicy::Upsert);
        let mut model: BTreeMap<u16, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => prop_assert_eq!(sut.insert(k, v), Ok(model.insert(k, v))),
                Op::Remove(k) => prop_assert_eq!(sut.remove(&k), model.remove(&k)),
                Op::Get(k) => prop_assert_eq!(sut.get(&k), model.get(&k)),
            }
            check_tree(&sut);
        }
        prop_assert_eq!(sut.len(), model.len());
    }
}

// Property: any insertion order of n distinct keys yields a tree no taller
// than the AVL bound 1.44 * log2(n + 2).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_avl_height_bound(keys in proptest::collection::hash_set(any::<u32>(), 1..500)) {
        let mut sut = AvlMap::new();
        for &k in &keys {
            sut.insert(k, ()).unwrap();
        }
        let n = keys.len() as f64;
        let bound = 1.4405 * (n + 2.0).log2();
        let height = sut.height().unwrap_or(0) as f64;
        prop_assert!(height <= bound, "height {} exceeds bound {} for n = {}", height, bound, n);
        check_tree(&sut);
    }
}
