//! BstMap: binary search tree without rebalancing.
//!
//! Shares the `AvlMap` contract but never rotates, so sorted input degrades
//! it into a list. All algorithms walk the tree iteratively because the
//! height is bounded only by `len()`.

use crate::map::{DuplicatePolicy, InsertError, KeyValueMap};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use std::collections::VecDeque;

type Link<K, V> = Option<Box<BstNode<K, V>>>;

struct BstNode<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    size: usize,
}

pub struct BstMap<K, V> {
    root: Link<K, V>,
    policy: DuplicatePolicy,
}

impl<K: Ord, V> BstMap<K, V> {
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self { root: None, policy }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut at = self.root.as_deref();
        while let Some(n) = at {
            at = match q.cmp(n.key.borrow()) {
                Ordering::Less => n.left.as_deref(),
                Ordering::Greater => n.right.as_deref(),
                Ordering::Equal => return Some(&n.value),
            };
        }
        None
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut at = self.root.as_deref_mut();
        while let Some(n) = at {
            at = match q.cmp(n.key.borrow()) {
                Ordering::Less => n.left.as_deref_mut(),
                Ordering::Greater => n.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut n.value),
            };
        }
        None
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(q).is_some()
    }

    /// Inserts `key` as a new leaf. A fresh key returns `Ok(None)`; an
    /// existing key is resolved by the map's `DuplicatePolicy`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        let policy = self.policy;
        if let Some(stored) = self.get_mut(&key) {
            return policy.resolve(stored, value);
        }
        let mut link = &mut self.root;
        while let Some(node) = link {
            node.size += 1;
            link = if key < node.key {
                &mut node.left
            } else {
                &mut node.right
            };
        }
        *link = Some(Box::new(BstNode {
            key,
            value,
            left: None,
            right: None,
            size: 1,
        }));
        Ok(None)
    }

    /// Removes `q` and returns its value. A node with two children takes over
    /// its in-order predecessor's entry instead of being unlinked.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if !self.contains_key(q) {
            return None;
        }
        let mut link = &mut self.root;
        loop {
            let ord = q.cmp(link.as_ref()?.key.borrow());
            if ord == Ordering::Equal {
                break;
            }
            let node = link.as_mut()?;
            node.size -= 1;
            link = if ord == Ordering::Less {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        let node = link.as_mut()?;
        if node.left.is_some() && node.right.is_some() {
            node.size -= 1;
            let pred = take_max(&mut node.left)?;
            let BstNode { key, value, .. } = *pred;
            node.key = key;
            return Some(core::mem::replace(&mut node.value, value));
        }
        let mut gone = link.take()?;
        *link = gone.left.take().or_else(|| gone.right.take());
        let BstNode { value, .. } = *gone;
        Some(value)
    }
}

/// Detaches the rightmost node below `link`, shrinking cached sizes on the way.
fn take_max<K, V>(mut link: &mut Link<K, V>) -> Option<Box<BstNode<K, V>>> {
    while link.as_ref()?.right.is_some() {
        let node = link.as_mut()?;
        node.size -= 1;
        link = &mut node.right;
    }
    let mut max = link.take()?;
    *link = max.left.take();
    Some(max)
}

impl<K, V> BstMap<K, V> {
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.size)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the root (a single node has height 0); `None` when empty.
    /// Walks the whole tree.
    pub fn height(&self) -> Option<usize> {
        let mut level: Vec<&BstNode<K, V>> = self.root.as_deref().into_iter().collect();
        let mut height = None;
        while !level.is_empty() {
            height = Some(height.map_or(0, |h| h + 1));
            level = level
                .into_iter()
                .flat_map(|n| [n.left.as_deref(), n.right.as_deref()])
                .flatten()
                .collect();
        }
        height
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut it = Iter {
            stack: Vec::new(),
            remaining: self.len(),
        };
        it.push_left_spine(self.root.as_deref());
        it
    }

    /// Entries breadth-first from the root.
    pub fn level_order(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut queue: VecDeque<&BstNode<K, V>> = self.root.as_deref().into_iter().collect();
        core::iter::from_fn(move || {
            let n = queue.pop_front()?;
            queue.extend(n.left.as_deref());
            queue.extend(n.right.as_deref());
            Some((&n.key, &n.value))
        })
    }
}

impl<K: Ord, V> Default for BstMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for BstMap<K, V> {
    fn drop(&mut self) {
        let mut stack: Vec<Box<BstNode<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut n) = stack.pop() {
            stack.extend(n.left.take());
            stack.extend(n.right.take());
        }
    }
}

impl<K: Ord, V> KeyValueMap<K, V> for BstMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        BstMap::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BstMap::get(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BstMap::remove(self, key)
    }

    fn len(&self) -> usize {
        BstMap::len(self)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BstMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, K, V> {
    stack: Vec<&'a BstNode<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left_spine(&mut self, mut at: Option<&'a BstNode<K, V>>) {
        while let Some(n) = at {
            self.stack.push(n);
            at = n.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.push_left_spine(n.right.as_deref());
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a BstMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
