// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Tag-dispatch from raw records to unbound variants.

use crate::bind::Unbound;
use crate::error::{Domain, ModelError};
use crate::record::TaggedRecord;
use fxhash::FxHashMap;

/// Turns a record into an unbound instance. Constructors only capture the record; they
/// must not look anything up.
pub type Constructor<H> = fn(TaggedRecord) -> Unbound<H>;

/// Maps the leading tag token of a record to the constructor of its variant.
///
/// Unknown tags are not errors: they go to the fallback constructor, which keeps the tag
/// around so it can be reported later.
pub struct VariantRegistry<H> {
    domain: Domain,
    constructors: FxHashMap<&'static str, Constructor<H>>,
    fallback: Constructor<H>,
}

impl<H> VariantRegistry<H> {
    pub fn new(domain: Domain, fallback: Constructor<H>) -> Self {
        VariantRegistry { domain, constructors: FxHashMap::default(), fallback }
    }

    /// Registers the constructor for `tag`.
    ///
    /// # Panics
    ///
    /// If `tag` already has a constructor. Registries are populated once when they are
    /// first used, so this is a configuration error, never a data error.
    pub fn register(&mut self, tag: &'static str, constructor: Constructor<H>) -> &mut Self {
        let previous = self.constructors.insert(tag, constructor);
        assert!(previous.is_none(), "{} tag `{tag}` registered twice", self.domain);
        self
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Builds the unbound instance for `record`. Only a record without any tag is rejected.
    pub fn build(&self, record: TaggedRecord) -> Result<Unbound<H>, ModelError> {
        let Some(tag) = record.tag_key() else {
            return Err(ModelError::EmptyTag { domain: self.domain, id: record.id });
        };
        let constructor = self.constructors.get(tag).copied().unwrap_or(self.fallback);
        Ok(constructor(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone)]
    enum Shape {
        Known,
        Other(String),
    }

    fn registry() -> VariantRegistry<Shape> {
        let mut registry = VariantRegistry::new(Domain::Type, |record| {
            let tag = record.tag_tokens[0].clone();
            Unbound::new(record, Shape::Other(tag))
        });
        registry.register("known", |record| Unbound::new(record, Shape::Known));
        registry
    }

    #[test]
    fn check_dispatch() {
        let registry = registry();
        let unbound = registry.build(TaggedRecord::new(1, &["known"], &[])).unwrap();
        assert_eq!(unbound.head(), &Shape::Known);
        assert_eq!(unbound.id(), 1);
    }

    #[test]
    fn check_fallback_keeps_tag() {
        let unbound = registry().build(TaggedRecord::new(2, &["xyz"], &[3])).unwrap();
        assert_eq!(unbound.head(), &Shape::Other("xyz".into()));
    }

    #[test]
    fn check_empty_tag() {
        let error = registry().build(TaggedRecord::new(2, &[] as &[&str], &[])).unwrap_err();
        assert_eq!(error, ModelError::EmptyTag { domain: Domain::Type, id: 2 });
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn check_duplicate_registration() {
        registry().register("known", |record| Unbound::new(record, Shape::Known));
    }
}
