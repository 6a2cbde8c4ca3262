// Contract property tests run through the `KeyValueMap` trait, so every
// container is held to the same observable behavior.
//
// Property: for a random op sequence, AvlMap, BstMap and HashTable agree with
// a BTreeMap model on every result, under both duplicate policies.
//  - insert: Ok(None) for fresh keys; Reject -> Err(DuplicateKey) and the
//    stored value survives; Upsert -> Ok(Some(old)).
//  - remove: returns the model's value; absent keys leave len alone.
//  - get: matches the model for present and absent keys.
//  - len/is_empty match after every op.
use assoc_maps::{AvlMap, BstMap, DuplicatePolicy, HashTable, InsertError, KeyValueMap};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u8),
    Remove(i16),
    Get(i16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let key = -40i16..40;
    prop_oneof![
        (key.clone(), any::<u8>()).prop_map(|(k, v)| Op::Insert(k, v)),
        key.clone().prop_map(Op::Remove),
        key.prop_map(Op::Get),
    ]
}

fn model_insert(
    model: &mut BTreeMap<i16, u8>,
    policy: DuplicatePolicy,
    k: i16,
    v: u8,
) -> Result<Option<u8>, InsertError> {
    if let Some(slot) = model.get_mut(&k) {
        return match policy {
            DuplicatePolicy::Reject => Err(InsertError::DuplicateKey),
            DuplicatePolicy::Upsert => Ok(Some(std::mem::replace(slot, v))),
        };
    }
    model.insert(k, v);
    Ok(None)
}

fn check_contract<M: KeyValueMap<i16, u8>>(
    mut sut: M,
    policy: DuplicatePolicy,
    ops: &[Op],
) -> Result<(), TestCaseError> {
    let mut model = BTreeMap::new();
    for op in ops {
        match *op {
            Op::Insert(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model_insert(&mut model, policy, k, v));
            }
            Op::Remove(k) => prop_assert_eq!(sut.remove(&k), model.remove(&k)),
            Op::Get(k) => prop_assert_eq!(sut.get(&k), model.get(&k)),
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_containers_share_contract(
        ops in proptest::collection::vec(arb_op(), 1..150),
        upsert in any::<bool>(),
    ) {
        let policy = if upsert { DuplicatePolicy::Upsert } else { DuplicatePolicy::Reject };
        check_contract(AvlMap::with_policy(policy), policy, &ops)?;
        check_contract(BstMap::with_policy(policy), policy, &ops)?;
        check_contract(HashTable::with_policy(policy), policy, &ops)?;
    }
}

// Property: inserting distinct pairs then reading every key back returns its
// value in every container.
proptest! {
    #[test]
    fn prop_round_trip(pairs in proptest::collection::btree_map(any::<i16>(), any::<u8>(), 0..300)) {
        fn fill<M: KeyValueMap<i16, u8>>(mut m: M, pairs: &BTreeMap<i16, u8>) -> M {
            for (&k, &v) in pairs {
                m.insert(k, v).unwrap();
            }
            m
        }
        let avl = fill(AvlMap::new(), &pairs);
        let bst = fill(BstMap::new(), &pairs);
        let table = fill(HashTable::new(), &pairs);
        for (k, v) in &pairs {
            prop_assert_eq!(avl.get(k), Some(v));
            prop_assert_eq!(bst.get(k), Some(v));
            prop_assert_eq!(table.get(k), Some(v));
        }
        prop_assert_eq!(avl.len(), pairs.len());
        prop_assert_eq!(bst.len(), pairs.len());
        prop_assert_eq!(table.len(), pairs.len());
        prop_assert!(avl.iter().map(|(k, v)| (*k, *v)).eq(pairs.iter().map(|(k, v)| (*k, *v))));
    }
}
