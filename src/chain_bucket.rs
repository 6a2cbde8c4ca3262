//! ChainBucket: the singly-linked list behind one hash-table slot.
//!
//! `head` plays the role of a sentinel's `next` link, so every node is owned
//! by exactly one link. Entries keep insertion order.

use crate::map::InsertError;
use core::borrow::Borrow;
use core::fmt;

type Link<K, V> = Option<Box<BucketNode<K, V>>>;

#[derive(Debug)]
struct BucketNode<K, V> {
    key: K,
    value: V,
    next: Link<K, V>,
}

pub struct ChainBucket<K, V> {
    head: Link<K, V>,
    len: usize,
}

impl<K, V> ChainBucket<K, V> {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries from head to tail, i.e. in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            next: self.head.as_deref(),
            remaining: self.len,
        }
    }

    /// Appends without a duplicate scan. Callers guarantee `key` is absent.
    pub(crate) fn push_back(&mut self, key: K, value: V) {
        let mut tail = &mut self.head;
        while let Some(node) = tail {
            tail = &mut node.next;
        }
        *tail = Some(Box::new(BucketNode {
            key,
            value,
            next: None,
        }));
        self.len += 1;
    }
}

impl<K: Eq, V> ChainBucket<K, V> {
    /// Appends a new entry. An existing key is never overwritten.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        if self.contains_key(&key) {
            return Err(InsertError::DuplicateKey);
        }
        self.push_back(key, value);
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.iter().find(|(k, _)| (*k).borrow() == key).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.head.as_deref_mut();
        while let Some(node) = cur {
            if node.key.borrow() == key {
                return Some(&mut node.value);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.get(key).is_some()
    }

    /// Unlinks the entry for `key`. Absent keys leave the chain unchanged.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let pos = self.iter().position(|(k, _)| (*k).borrow() == key)?;
        let mut link = &mut self.head;
        for _ in 0..pos {
            link = &mut link.as_mut()?.next;
        }
        let mut node = link.take()?;
        *link = node.next.take();
        self.len -= 1;
        Some(node.value)
    }
}

impl<K, V> Default for ChainBucket<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for ChainBucket<K, V> {
    fn drop(&mut self) {
        // Unlink node by node; the default recursive drop can overflow the
        // stack on a long chain.
        let mut cur = self.head.take();
        while let Some(mut node) = cur {
            cur = node.next.take();
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ChainBucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for ChainBucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{{ key: {k}, value: {v} }}")?;
        }
        Ok(())
    }
}

/// Iterator over a bucket's entries in insertion order.
pub struct Iter<'a, K, V> {
    next: Option<&'a BucketNode<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a ChainBucket<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator; consumes the chain head first.
pub struct IntoIter<K, V> {
    next: Link<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;
        let BucketNode { key, value, next } = *node;
        self.next = next;
        Some((key, value))
    }
}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        let mut cur = self.next.take();
        while let Some(mut node) = cur {
            cur = node.next.take();
        }
    }
}

impl<K, V> IntoIterator for ChainBucket<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(mut self) -> Self::IntoIter {
        self.len = 0;
        IntoIter {
            next: self.head.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_of(keys: &[&'static str]) -> ChainBucket<&'static str, usize> {
        let mut b = ChainBucket::new();
        for (i, k) in keys.iter().enumerate() {
            b.insert(*k, i).unwrap();
        }
        b
    }

    /// Invariant: a duplicate insert fails and keeps the first value.
    #[test]
    fn duplicate_insert_rejected() {
        let mut b = bucket_of(&["a"]);
        assert_eq!(b.insert("a", 9), Err(InsertError::DuplicateKey));
        assert_eq!(b.get("a"), Some(&0));
        assert_eq!(b.len(), 1);
    }

    /// Invariant: iteration follows insertion order.
    #[test]
    fn iteration_in_insertion_order() {
        let b = bucket_of(&["c", "a", "b"]);
        let keys: Vec<_> = b.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["c", "a", "b"]);
        assert_eq!(b.iter().len(), 3);
    }

    /// Invariant: removing head, middle and tail relinks the rest.
    #[test]
    fn remove_head_middle_tail() {
        let mut b = bucket_of(&["a", "b", "c", "d"]);
        assert_eq!(b.remove("b"), Some(1));
        assert_eq!(b.remove("a"), Some(0));
        assert_eq!(b.remove("d"), Some(3));
        let keys: Vec<_> = b.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["c"]);
        assert_eq!(b.len(), 1);
        assert_eq!(b.remove("c"), Some(2));
        assert!(b.is_empty());
    }

    /// Invariant: removing an absent key changes nothing.
    #[test]
    fn remove_absent_is_noop() {
        let mut b = bucket_of(&["a", "b"]);
        assert_eq!(b.remove("z"), None);
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("b"), Some(&1));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut b = bucket_of(&["a", "b"]);
        *b.get_mut("b").unwrap() += 10;
        assert_eq!(b.get("b"), Some(&11));
        assert!(b.get_mut("z").is_none());
    }

    #[test]
    fn into_iter_yields_owned_pairs_in_order() {
        let b = bucket_of(&["x", "y"]);
        let pairs: Vec<_> = b.into_iter().collect();
        assert_eq!(pairs, [("x", 0), ("y", 1)]);
    }

    #[test]
    fn display_lists_entries() {
        let b = bucket_of(&["a", "b"]);
        assert_eq!(b.to_string(), "{ key: a, value: 0 } { key: b, value: 1 }");
        assert_eq!(ChainBucket::<u8, u8>::new().to_string(), "");
    }

    #[test]
    fn long_chain_drops_without_overflow() {
        let mut b = ChainBucket::new();
        for i in 0..200_000u32 {
            let next = b.head.take();
            b.head = Some(Box::new(BucketNode {
                key: i,
                value: (),
                next,
            }));
            b.len += 1;
        }
        assert_eq!(b.len(), 200_000);
        drop(b);
    }
}
