// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The two-phase build/bind protocol.
//!
//! Every record is first constructed as an [Unbound] instance, which owns nothing but the
//! variant head chosen from its tag and the raw tag tokens and arguments. Once every
//! record of a unit exists, [Unbound::bind] consumes each instance and produces the bound
//! variant. Since binding consumes the unbound value, binding twice cannot be expressed,
//! and the raw tokens are gone once it returns.

use crate::dictionary::{Dictionary, Ref};
use crate::error::{Domain, ModelError};
use crate::record::{Id, TaggedRecord};
use crate::term::{Expression, LValue};
use crate::typ::{CType, CompInfo, FunArgs};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::AddAssign;
use tracing::debug;

/// A constructed but not yet bound instance.
#[derive(Debug)]
pub struct Unbound<H> {
    id: Id,
    head: H,
    tags: Vec<String>,
    args: Vec<i64>,
}

impl<H> Unbound<H> {
    pub fn new(record: TaggedRecord, head: H) -> Self {
        Unbound { id: record.id, head, tags: record.tag_tokens, args: record.args }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// What is known about the variant before binding.
    pub fn head(&self) -> &H {
        &self.head
    }
}

impl<H: fmt::Display> Unbound<H> {
    /// Resolves the raw arguments against `scope`, consuming this instance.
    pub fn bind<V: Bindable<Head = H>>(self, scope: &BindScope<'_>) -> Result<V, BindFailure> {
        let Unbound { id, head, tags, args } = self;
        let reader = ArgReader { domain: V::DOMAIN, id, tags, args, scope };
        V::bind(&head, reader).map_err(|error| BindFailure { id, kind: head.to_string(), error })
    }
}

/// A variant that is built in two phases.
pub trait Bindable: Sized + Send {
    /// The part of the variant resolved at construction time from the tag alone.
    type Head: fmt::Display + Send;

    const DOMAIN: Domain;

    fn bind(head: &Self::Head, args: ArgReader<'_>) -> Result<Self, ModelError>;
}

/// A record that could not be bound. The kind is the display of the record's head, so
/// the report names the variant even though its fields were never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindFailure {
    pub id: Id,
    pub kind: String,
    pub error: ModelError,
}

impl fmt::Display for BindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.kind)
    }
}

/// The dictionaries of a unit as they are after construction: what bind may refer to.
///
/// Bindable domains are only visible through their ids, since their instances may not
/// be bound yet. The other domains are complete at construction.
#[derive(Clone, Copy)]
pub struct BindScope<'a> {
    types: &'a BTreeSet<Id>,
    funargs: &'a BTreeSet<Id>,
    compinfos: &'a Dictionary<CompInfo>,
    expressions: &'a Dictionary<Expression>,
    lvalues: &'a Dictionary<LValue>,
}

impl<'a> BindScope<'a> {
    pub fn new(
        types: &'a BTreeSet<Id>,
        funargs: &'a BTreeSet<Id>,
        compinfos: &'a Dictionary<CompInfo>,
        expressions: &'a Dictionary<Expression>,
        lvalues: &'a Dictionary<LValue>,
    ) -> Self {
        BindScope { types, funargs, compinfos, expressions, lvalues }
    }

    /// Checks that `id` was constructed in `domain`.
    pub fn get(&self, domain: Domain, id: Id) -> Result<(), ModelError> {
        let exists = match domain {
            Domain::Type => self.types.contains(&id),
            Domain::Funargs => self.funargs.contains(&id),
            Domain::Struct => self.compinfos.contains(id),
            Domain::Expression => self.expressions.contains(id),
            Domain::Lvalue => self.lvalues.contains(id),
            _ => false,
        };
        if exists { Ok(()) } else { Err(ModelError::MissingReference { domain, id }) }
    }

    pub fn typ(&self, id: Id) -> Result<Ref<CType>, ModelError> {
        self.get(Domain::Type, id).map(|_| Ref::new(id))
    }

    pub fn funargs(&self, id: Id) -> Result<Ref<FunArgs>, ModelError> {
        self.get(Domain::Funargs, id).map(|_| Ref::new(id))
    }

    pub fn compinfo(&self, key: Id) -> Result<Ref<CompInfo>, ModelError> {
        self.compinfos.reference(key)
    }

    pub fn expression(&self, id: Id) -> Result<Ref<Expression>, ModelError> {
        self.expressions.reference(id)
    }

    pub fn lvalue(&self, id: Id) -> Result<Ref<LValue>, ModelError> {
        self.lvalues.reference(id)
    }
}

/// Positional access to the raw fields of the instance being bound. Every variant binds
/// through this, naming which argument positions are references into which domain and
/// which tag positions are literal sub-kinds.
pub struct ArgReader<'s> {
    domain: Domain,
    id: Id,
    tags: Vec<String>,
    args: Vec<i64>,
    scope: &'s BindScope<'s>,
}

impl ArgReader<'_> {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn arg(&self, position: usize) -> Result<Id, ModelError> {
        self.args.get(position).copied().ok_or(ModelError::MissingArgument {
            domain: self.domain,
            id: self.id,
            position,
        })
    }

    pub fn args(&self) -> &[i64] {
        &self.args
    }

    pub fn tag(&self, position: usize) -> Result<String, ModelError> {
        let tag = self.tags.get(position).filter(|tag| !tag.is_empty());
        tag.cloned().ok_or(ModelError::MissingTag {
            domain: self.domain,
            id: self.id,
            position,
        })
    }

    pub fn typ(&self, position: usize) -> Result<Ref<CType>, ModelError> {
        self.scope.typ(self.arg(position)?)
    }

    pub fn funargs(&self, position: usize) -> Result<Ref<FunArgs>, ModelError> {
        self.scope.funargs(self.arg(position)?)
    }

    pub fn compinfo(&self, position: usize) -> Result<Ref<CompInfo>, ModelError> {
        self.scope.compinfo(self.arg(position)?)
    }

    pub fn expression(&self, position: usize) -> Result<Ref<Expression>, ModelError> {
        self.scope.expression(self.arg(position)?)
    }

    pub fn lvalue(&self, position: usize) -> Result<Ref<LValue>, ModelError> {
        self.scope.lvalue(self.arg(position)?)
    }
}

/// The order in which [bind_all] visits the instances of a dictionary. The result does
/// not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindOrder {
    #[default]
    Declaration,
    Reversed,
    /// On the current rayon pool.
    Parallel,
}

/// Construction and bind counts for one domain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BindStats {
    pub constructed: usize,
    pub bound: usize,
    pub failed: usize,
}

impl AddAssign for BindStats {
    fn add_assign(&mut self, other: Self) {
        self.constructed += other.constructed;
        self.bound += other.bound;
        self.failed += other.failed;
    }
}

/// Binds every instance of `pending`. Instances that fail are left out of the result and
/// returned as failures, in id order.
pub fn bind_all<V: Bindable>(
    pending: Dictionary<Unbound<V::Head>>,
    scope: &BindScope<'_>,
    order: BindOrder,
) -> (Dictionary<V>, Vec<BindFailure>, BindStats) {
    let domain = pending.domain();
    let constructed = pending.len();
    let entries: Vec<(Id, Unbound<V::Head>)> = pending.into_entries().into_iter().collect();
    let results: Vec<(Id, Result<V, BindFailure>)> = match order {
        BindOrder::Declaration => {
            entries.into_iter().map(|(id, unbound)| (id, unbound.bind(scope))).collect()
        }
        BindOrder::Reversed => {
            entries.into_iter().rev().map(|(id, unbound)| (id, unbound.bind(scope))).collect()
        }
        BindOrder::Parallel => {
            entries.into_par_iter().map(|(id, unbound)| (id, unbound.bind(scope))).collect()
        }
    };

    let mut bound = BTreeMap::new();
    let mut failures = Vec::new();
    for (id, result) in results {
        match result {
            Ok(value) => {
                bound.insert(id, value);
            }
            Err(failure) => failures.push(failure),
        }
    }
    failures.sort_by_key(|failure| failure.id);

    let stats = BindStats { constructed, bound: bound.len(), failed: failures.len() };
    debug!(%domain, ?order, ?stats, "bind_all");
    (Dictionary::from_entries(domain, bound), failures, stats)
}
