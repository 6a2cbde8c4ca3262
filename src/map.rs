//! Shared contract of the containers: the insert error, the duplicate-key
//! policy and the `KeyValueMap` trait external callers program against.

use thiserror::Error;

/// Failure of an insert under [`DuplicatePolicy::Reject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("key already present")]
    DuplicateKey,
}

/// What an insert does when the key is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// Leave the stored value alone and return `Err(InsertError::DuplicateKey)`.
    #[default]
    Reject,
    /// Replace the stored value and hand the old one back as `Ok(Some(old))`.
    Upsert,
}

impl DuplicatePolicy {
    /// Applies the policy to an occupied slot.
    pub(crate) fn resolve<V>(self, slot: &mut V, value: V) -> Result<Option<V>, InsertError> {
        match self {
            DuplicatePolicy::Reject => Err(InsertError::DuplicateKey),
            DuplicatePolicy::Upsert => Ok(Some(core::mem::replace(slot, value))),
        }
    }
}

/// The operations every container in this crate offers.
///
/// Inherent methods on each type accept borrowed key forms; this trait fixes
/// the query type to `&K` so callers can be generic over the container.
pub trait KeyValueMap<K, V> {
    /// Inserts `key`. Returns `Ok(None)` for a fresh key; duplicates follow
    /// the container's [`DuplicatePolicy`].
    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError>;

    fn get(&self, key: &K) -> Option<&V>;

    /// Removes `key` and returns its value. Absent keys are a no-op.
    fn remove(&mut self, key: &K) -> Option<V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_leaves_slot_untouched() {
        let mut slot = 1;
        assert_eq!(
            DuplicatePolicy::Reject.resolve(&mut slot, 2),
            Err(InsertError::DuplicateKey)
        );
        assert_eq!(slot, 1);
    }

    #[test]
    fn upsert_returns_previous_value() {
        let mut slot = 1;
        assert_eq!(DuplicatePolicy::Upsert.resolve(&mut slot, 2), Ok(Some(1)));
        assert_eq!(slot, 2);
    }

    #[test]
    fn error_display() {
        assert_eq!(InsertError::DuplicateKey.to_string(), "key already present");
        assert_eq!(DuplicatePolicy::default(), DuplicatePolicy::Reject);
    }
}
