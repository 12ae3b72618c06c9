// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Id-keyed stores of one domain, and the typed handles pointing into them.

use crate::error::{Domain, ModelError};
use crate::record::Id;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A reference to a `V` stored in some [Dictionary] of the same unit.
///
/// A `Ref` is only a checked id: holding one says the target was constructed, not that
/// it was bound, and it is dereferenced through the dictionary at read time. This is
/// what makes cyclic structures representable.
pub struct Ref<V> {
    id: Id,
    _target: PhantomData<fn() -> V>,
}

impl<V> Ref<V> {
    pub(crate) fn new(id: Id) -> Self {
        Ref { id, _target: PhantomData }
    }

    pub fn id(&self) -> Id {
        self.id
    }
}

// Derives would require `V` to implement these traits too.
impl<V> Clone for Ref<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Ref<V> {}

impl<V> PartialEq for Ref<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for Ref<V> {}

impl<V> Hash for Ref<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<V> fmt::Debug for Ref<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// The variants of one domain in one unit, keyed by id.
///
/// Entries are ordered by id so that iteration, and everything derived from it, is
/// deterministic. Lookups never mutate the dictionary.
#[derive(Debug, Clone)]
pub struct Dictionary<V> {
    domain: Domain,
    entries: BTreeMap<Id, V>,
}

impl<V> Dictionary<V> {
    pub fn new(domain: Domain) -> Self {
        Dictionary { domain, entries: BTreeMap::new() }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.entries.contains_key(&id)
    }

    /// Adds an entry. Ids must be unique within a dictionary.
    pub fn insert(&mut self, id: Id, value: V) -> Result<(), ModelError> {
        if self.entries.contains_key(&id) {
            return Err(ModelError::DuplicateId { domain: self.domain, id });
        }
        self.entries.insert(id, value);
        Ok(())
    }

    /// Strict lookup: a missing id is an error, never a default.
    pub fn get(&self, id: Id) -> Result<&V, ModelError> {
        self.entries.get(&id).ok_or(ModelError::MissingReference { domain: self.domain, id })
    }

    pub(crate) fn get_mut(&mut self, id: Id) -> Result<&mut V, ModelError> {
        let domain = self.domain;
        self.entries.get_mut(&id).ok_or(ModelError::MissingReference { domain, id })
    }

    pub fn resolve(&self, target: Ref<V>) -> Result<&V, ModelError> {
        self.get(target.id)
    }

    /// A handle to the entry `id`, if it exists.
    pub fn reference(&self, id: Id) -> Result<Ref<V>, ModelError> {
        if self.contains(id) {
            Ok(Ref::new(id))
        } else {
            Err(ModelError::MissingReference { domain: self.domain, id })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &V)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    pub fn ids(&self) -> BTreeSet<Id> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn from_entries(domain: Domain, entries: BTreeMap<Id, V>) -> Self {
        Dictionary { domain, entries }
    }

    pub(crate) fn into_entries(self) -> BTreeMap<Id, V> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_strict_lookup() {
        let mut dictionary = Dictionary::new(Domain::Expression);
        dictionary.insert(4, "x").unwrap();
        assert_eq!(dictionary.get(4), Ok(&"x"));
        assert_eq!(
            dictionary.get(5),
            Err(ModelError::MissingReference { domain: Domain::Expression, id: 5 })
        );
        assert_eq!(
            dictionary.insert(4, "y"),
            Err(ModelError::DuplicateId { domain: Domain::Expression, id: 4 })
        );
        assert_eq!(dictionary.get(4), Ok(&"x"));
    }

    #[test]
    fn check_lookup_identity() {
        let mut dictionary = Dictionary::new(Domain::Type);
        dictionary.insert(1, String::from("void")).unwrap();
        let first = dictionary.get(1).unwrap();
        let second = dictionary.resolve(dictionary.reference(1).unwrap()).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn check_references() {
        let mut dictionary = Dictionary::new(Domain::Type);
        dictionary.insert(2, ()).unwrap();
        let r = dictionary.reference(2).unwrap();
        assert_eq!(r.id(), 2);
        assert_eq!(format!("{r:?}"), "#2");
        assert!(dictionary.reference(3).is_err());
    }
}
