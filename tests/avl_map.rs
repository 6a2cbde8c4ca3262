use assoc_maps::{AvlMap, BstMap, DuplicatePolicy, InsertError};

#[test]
fn ascending_one_to_seven_is_perfectly_balanced() {
    let mut m = AvlMap::new();
    for k in 1..=7 {
        m.insert(k, k.to_string()).unwrap();
    }
    assert_eq!(m.height(), Some(2));
    assert_eq!(m.len(), 7);
    let keys: Vec<i32> = m.keys().copied().collect();
    assert_eq!(keys, (1..=7).collect::<Vec<_>>());
    let first_level: Vec<i32> = m.level_order().take(3).map(|(k, _)| *k).collect();
    assert_eq!(first_level, [4, 2, 6]);
}

#[test]
fn deleting_two_child_root_promotes_predecessor() {
    let mut m = AvlMap::new();
    for k in [5, 2, 8, 1] {
        m.insert(k, ()).unwrap();
    }
    assert_eq!(m.remove(&5), Some(()));
    assert_eq!(m.level_order().next().map(|(k, _)| *k), Some(2));
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), [1, 2, 8]);
    assert_eq!(m.height(), Some(1));
}

#[test]
fn avl_stays_logarithmic_where_bst_degenerates() {
    let mut avl = AvlMap::new();
    let mut bst = BstMap::new();
    for k in 0..1024u32 {
        avl.insert(k, k).unwrap();
        bst.insert(k, k).unwrap();
    }
    assert_eq!(avl.height(), Some(10));
    assert_eq!(bst.height(), Some(1023));
    assert!(avl.iter().eq(bst.iter()));
}

#[test]
fn drain_by_removal_empties_map() {
    let mut m = AvlMap::new();
    for k in 0..500 {
        m.insert(k, k * 2).unwrap();
    }
    for k in (0..500).filter(|k| k % 3 == 0) {
        assert_eq!(m.remove(&k), Some(k * 2));
    }
    assert_eq!(m.len(), 500 - 167);
    assert!(m.height().unwrap() <= 12);
    for k in 0..500 {
        assert_eq!(m.get(&k).is_some(), k % 3 != 0);
    }
    let rest: Vec<_> = m.keys().copied().collect();
    for k in rest {
        m.remove(&k);
    }
    assert!(m.is_empty());
    assert_eq!(m.iter().next(), None);
}

#[test]
fn iteration_is_restartable() {
    let mut m = AvlMap::new();
    for k in [3, 1, 2] {
        m.insert(k, ()).unwrap();
    }
    let a: Vec<_> = m.iter().collect();
    let b: Vec<_> = (&m).into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(m.iter().len(), 3);
}

#[test]
fn duplicate_rejected_by_default_replaced_on_upsert() {
    let mut m = AvlMap::new();
    m.insert("k", 1).unwrap();
    match m.insert("k", 2) {
        Err(InsertError::DuplicateKey) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(m.get("k"), Some(&1));

    let mut u = AvlMap::with_policy(DuplicatePolicy::Upsert);
    assert_eq!(u.policy(), DuplicatePolicy::Upsert);
    u.insert("k", 1).unwrap();
    assert_eq!(u.insert("k", 2), Ok(Some(1)));
    assert_eq!(u.len(), 1);
}
