//! AvlMap: height-balanced binary search tree over a slot arena.
//!
//! Nodes live in a `SlotMap` and link to each other by node key, so each node
//! is owned by the arena and referenced by exactly one parent link (or the
//! root). Every node caches its height (leaf = 0, empty = -1), subtree size
//! and balance factor `height(right) - height(left)`. Insert and remove
//! recompute those fields on the way back up and rebalance each ancestor, so
//! after every mutation all balance factors lie in {-1, 0, 1}.

use crate::map::{DuplicatePolicy, InsertError, KeyValueMap};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use slotmap::{new_key_type, SlotMap};
use std::collections::VecDeque;

new_key_type! {
    /// Arena key of a tree node.
    pub(crate) struct NodeKey;
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Option<NodeKey>,
    pub(crate) right: Option<NodeKey>,
    pub(crate) height: i32,
    pub(crate) size: usize,
    pub(crate) balance: i32,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
            height: 0,
            size: 1,
            balance: 0,
        }
    }
}

pub struct AvlMap<K, V> {
    pub(crate) nodes: SlotMap<NodeKey, Node<K, V>>,
    pub(crate) root: Option<NodeKey>,
    policy: DuplicatePolicy,
}

impl<K: Ord, V> AvlMap<K, V> {
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            policy,
        }
    }
}

impl<K: Ord, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AvlMap<K, V> {
    pub fn len(&self) -> usize {
        self.root.map_or(0, |r| self.nodes[r].size)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Height of the root (a single node has height 0); `None` when empty.
    pub fn height(&self) -> Option<usize> {
        self.root.map(|r| self.nodes[r].height as usize)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut it = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
            remaining: self.len(),
        };
        it.push_left_spine(self.root);
        it
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Entries breadth-first from the root, left before right on each level.
    pub fn level_order(&self) -> LevelOrder<'_, K, V> {
        LevelOrder {
            nodes: &self.nodes,
            queue: self.root.into_iter().collect(),
        }
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let mut at = self.root?;
        while let Some(l) = self.nodes[at].left {
            at = l;
        }
        let n = &self.nodes[at];
        Some((&n.key, &n.value))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut at = self.root?;
        while let Some(r) = self.nodes[at].right {
            at = r;
        }
        let n = &self.nodes[at];
        Some((&n.key, &n.value))
    }

    /// The entry with exactly `index` smaller keys, found through cached
    /// subtree sizes in O(log n).
    pub fn select(&self, mut index: usize) -> Option<(&K, &V)> {
        let mut at = self.root;
        while let Some(id) = at {
            let n = &self.nodes[id];
            let left_size = self.size_of(n.left);
            match index.cmp(&left_size) {
                Ordering::Less => at = n.left,
                Ordering::Equal => return Some((&n.key, &n.value)),
                Ordering::Greater => {
                    index -= left_size + 1;
                    at = n.right;
                }
            }
        }
        None
    }

    fn size_of(&self, link: Option<NodeKey>) -> usize {
        link.map_or(0, |k| self.nodes[k].size)
    }

    fn height_of(&self, link: Option<NodeKey>) -> i32 {
        link.map_or(-1, |k| self.nodes[k].height)
    }

    /// Recomputes height, size and balance of `id` from its children.
    fn refresh(&mut self, id: NodeKey) {
        let (left, right) = {
            let n = &self.nodes[id];
            (n.left, n.right)
        };
        let (hl, hr) = (self.height_of(left), self.height_of(right));
        let size = 1 + self.size_of(left) + self.size_of(right);
        let n = &mut self.nodes[id];
        n.height = 1 + hl.max(hr);
        n.size = size;
        n.balance = hr - hl;
    }

    fn rotate_right(&mut self, root: NodeKey) -> NodeKey {
        let Some(pivot) = self.nodes[root].left else {
            return root;
        };
        let moved = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(root);
        self.nodes[root].left = moved;
        self.refresh(root);
        self.refresh(pivot);
        pivot
    }

    fn rotate_left(&mut self, root: NodeKey) -> NodeKey {
        let Some(pivot) = self.nodes[root].right else {
            return root;
        };
        let moved = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(root);
        self.nodes[root].right = moved;
        self.refresh(root);
        self.refresh(pivot);
        pivot
    }

    /// Restores the balance of `id`, whose own fields are already current.
    /// Returns the root of the rebalanced subtree.
    fn rebalance(&mut self, id: NodeKey) -> NodeKey {
        let balance = self.nodes[id].balance;
        match balance {
            -2 => {
                let child = self.nodes[id].left;
                if let Some(left) = child {
                    if self.nodes[left].balance == 1 {
                        let new_left = self.rotate_left(left);
                        self.nodes[id].left = Some(new_left);
                    }
                }
                self.rotate_right(id)
            }
            2 => {
                let child = self.nodes[id].right;
                if let Some(right) = child {
                    if self.nodes[right].balance == -1 {
                        let new_right = self.rotate_right(right);
                        self.nodes[id].right = Some(new_right);
                    }
                }
                self.rotate_left(id)
            }
            _ => id,
        }
    }

    /// Unhooks the rightmost node under `id`, rebalancing the path above it.
    /// Returns the new subtree root and the detached node, which stays in the
    /// arena until the caller releases it.
    fn detach_max(&mut self, id: NodeKey) -> (Option<NodeKey>, NodeKey) {
        let right = self.nodes[id].right;
        match right {
            None => (self.nodes[id].left.take(), id),
            Some(right) => {
                let (new_right, max) = self.detach_max(right);
                self.nodes[id].right = new_right;
                self.refresh(id);
                (Some(self.rebalance(id)), max)
            }
        }
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(q).map(|id| &self.nodes[id].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let id = self.find(q)?;
        Some(&mut self.nodes[id].value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(q).is_some()
    }

    /// Number of stored keys strictly smaller than `q`.
    pub fn rank<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut rank = 0;
        let mut at = self.root;
        while let Some(id) = at {
            let n = &self.nodes[id];
            match q.cmp(n.key.borrow()) {
                Ordering::Less => at = n.left,
                Ordering::Equal => return rank + self.size_of(n.left),
                Ordering::Greater => {
                    rank += self.size_of(n.left) + 1;
                    at = n.right;
                }
            }
        }
        rank
    }

    fn find<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut at = self.root;
        while let Some(id) = at {
            let n = &self.nodes[id];
            at = match q.cmp(n.key.borrow()) {
                Ordering::Less => n.left,
                Ordering::Greater => n.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Inserts `key`. A fresh key returns `Ok(None)`; an existing key is
    /// resolved by the map's `DuplicatePolicy`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        let (root, outcome) = self.insert_at(self.root, key, value);
        self.root = Some(root);
        outcome
    }

    fn insert_at(
        &mut self,
        at: Option<NodeKey>,
        key: K,
        value: V,
    ) -> (NodeKey, Result<Option<V>, InsertError>) {
        let Some(id) = at else {
            return (self.nodes.insert(Node::leaf(key, value)), Ok(None));
        };
        let ord = key.cmp(&self.nodes[id].key);
        let outcome = match ord {
            Ordering::Less => {
                let (child, outcome) = self.insert_at(self.nodes[id].left, key, value);
                self.nodes[id].left = Some(child);
                outcome
            }
            Ordering::Greater => {
                let (child, outcome) = self.insert_at(self.nodes[id].right, key, value);
                self.nodes[id].right = Some(child);
                outcome
            }
            Ordering::Equal => {
                let policy = self.policy;
                return (id, policy.resolve(&mut self.nodes[id].value, value));
            }
        };
        self.refresh(id);
        (self.rebalance(id), outcome)
    }

    /// Removes `q` and returns its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (root, removed) = self.remove_at(self.root, q);
        self.root = root;
        removed
    }

    fn remove_at<Q>(&mut self, at: Option<NodeKey>, q: &Q) -> (Option<NodeKey>, Option<V>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(id) = at else {
            return (None, None);
        };
        let ord = q.cmp(self.nodes[id].key.borrow());
        let removed = match ord {
            Ordering::Less => {
                let (child, removed) = self.remove_at(self.nodes[id].left, q);
                self.nodes[id].left = child;
                removed
            }
            Ordering::Greater => {
                let (child, removed) = self.remove_at(self.nodes[id].right, q);
                self.nodes[id].right = child;
                removed
            }
            Ordering::Equal => {
                let (left, right) = (self.nodes[id].left, self.nodes[id].right);
                match (left, right) {
                    (Some(left), Some(_)) => {
                        // Two children: the in-order predecessor's payload
                        // moves into this node, the predecessor node goes.
                        let (new_left, pred) = self.detach_max(left);
                        self.nodes[id].left = new_left;
                        self.nodes.remove(pred).map(|pred| {
                            let n = &mut self.nodes[id];
                            n.key = pred.key;
                            core::mem::replace(&mut n.value, pred.value)
                        })
                    }
                    (child, None) | (None, child) => {
                        let gone = self.nodes.remove(id).map(|n| n.value);
                        return (child, gone);
                    }
                }
            }
        };
        self.refresh(id);
        (Some(self.rebalance(id)), removed)
    }
}

impl<K: Ord, V> KeyValueMap<K, V> for AvlMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        AvlMap::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        AvlMap::get(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        AvlMap::remove(self, key)
    }

    fn len(&self) -> usize {
        AvlMap::len(self)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// In-order iterator over an `AvlMap`.
pub struct Iter<'a, K, V> {
    nodes: &'a SlotMap<NodeKey, Node<K, V>>,
    stack: Vec<NodeKey>,
    remaining: usize,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left_spine(&mut self, mut at: Option<NodeKey>) {
        while let Some(id) = at {
            self.stack.push(id);
            at = self.nodes[id].left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let nodes = self.nodes;
        let n = &nodes[id];
        self.push_left_spine(n.right);
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Breadth-first iterator over an `AvlMap`.
pub struct LevelOrder<'a, K, V> {
    nodes: &'a SlotMap<NodeKey, Node<K, V>>,
    queue: VecDeque<NodeKey>,
}

impl<'a, K, V> Iterator for LevelOrder<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let nodes = self.nodes;
        let n = &nodes[id];
        self.queue.extend(n.left);
        self.queue.extend(n.right);
        Some((&n.key, &n.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(keys: &[i32]) -> AvlMap<i32, i32> {
        let mut m = AvlMap::new();
        for &k in keys {
            m.insert(k, k * 10).unwrap();
        }
        m
    }

    fn root_key(m: &AvlMap<i32, i32>) -> Option<i32> {
        m.root.map(|r| m.nodes[r].key)
    }

    /// Invariant: ascending inserts 1..=7 produce the perfect tree rooted at 4.
    #[test]
    fn ascending_inserts_stay_balanced() {
        let m = map_of(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(m.height(), Some(2));
        assert_eq!(root_key(&m), Some(4));
        let keys: Vec<_> = m.keys().copied().collect();
        assert_eq!(keys, [1, 2, 3, 4, 5, 6, 7]);
        let levels: Vec<_> = m.level_order().map(|(k, _)| *k).collect();
        assert_eq!(levels, [4, 2, 6, 1, 3, 5, 7]);
    }

    /// Invariant: deleting a two-child node promotes its in-order predecessor.
    #[test]
    fn remove_two_child_root_uses_predecessor() {
        let mut m = map_of(&[5, 2, 8, 1]);
        let old_root = m.root;
        assert_eq!(m.remove(&5), Some(50));
        assert_eq!(root_key(&m), Some(2));
        assert_eq!(m.root, old_root, "the root node keeps its identity");
        assert_eq!(m.get(&2), Some(&20));
        let levels: Vec<_> = m.level_order().map(|(k, _)| *k).collect();
        assert_eq!(levels, [2, 1, 8]);
        assert_eq!(m.nodes.len(), 3);
    }

    /// Invariant: left-right and right-left shapes resolve with double rotations.
    #[test]
    fn double_rotations() {
        let lr = map_of(&[3, 1, 2]);
        assert_eq!(root_key(&lr), Some(2));
        assert_eq!(lr.height(), Some(1));

        let rl = map_of(&[1, 3, 2]);
        assert_eq!(root_key(&rl), Some(2));
        assert_eq!(rl.height(), Some(1));
    }

    #[test]
    fn remove_leaf_and_single_child() {
        let mut m = map_of(&[2, 1, 3, 4]);
        assert_eq!(m.remove(&3), Some(30)); // one child (4)
        assert_eq!(m.remove(&1), Some(10)); // leaf
        let keys: Vec<_> = m.keys().copied().collect();
        assert_eq!(keys, [2, 4]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.nodes.len(), 2);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut m = map_of(&[1, 2, 3]);
        assert_eq!(m.remove(&9), None);
        assert_eq!(m.len(), 3);
        let mut empty: AvlMap<i32, i32> = AvlMap::new();
        assert_eq!(empty.remove(&1), None);
        assert!(empty.is_empty());
        assert_eq!(empty.height(), None);
    }

    #[test]
    fn duplicate_policies() {
        let mut m = map_of(&[1]);
        assert_eq!(m.insert(1, 99), Err(InsertError::DuplicateKey));
        assert_eq!(m.get(&1), Some(&10));

        let mut u = AvlMap::with_policy(DuplicatePolicy::Upsert);
        assert_eq!(u.insert(1, "a"), Ok(None));
        assert_eq!(u.insert(1, "b"), Ok(Some("a")));
        assert_eq!(u.get(&1), Some(&"b"));
        assert_eq!(u.len(), 1);
    }

    #[test]
    fn order_statistics() {
        let m = map_of(&[40, 10, 30, 20, 50]);
        assert_eq!(m.first_key_value(), Some((&10, &100)));
        assert_eq!(m.last_key_value(), Some((&50, &500)));
        assert_eq!(m.select(0), Some((&10, &100)));
        assert_eq!(m.select(3), Some((&40, &400)));
        assert_eq!(m.select(5), None);
        assert_eq!(m.rank(&10), 0);
        assert_eq!(m.rank(&35), 3);
        assert_eq!(m.rank(&99), 5);
    }

    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: AvlMap<String, i32> = AvlMap::new();
        m.insert("hello".to_string(), 1).unwrap();
        assert_eq!(m.get("hello"), Some(&1));
        assert!(!m.contains_key("world"));
        *m.get_mut("hello").unwrap() += 1;
        assert_eq!(m.remove("hello"), Some(2));
    }

    #[test]
    fn debug_lists_in_key_order() {
        let m = map_of(&[2, 1]);
        assert_eq!(format!("{m:?}"), "{1: 10, 2: 20}");
    }
}
