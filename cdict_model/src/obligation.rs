// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Proof obligations and the assumptions attached to them.

use crate::dictionary::{Dictionary, Ref};
use crate::error::{Domain, ModelError};
use crate::predicate::Predicate;
use crate::record::{Id, TaggedRecord, parse_id_list};
use cdict_metadata::ApiAssumptionNode;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

fn predicate_arg(
    domain: Domain,
    record: &TaggedRecord,
    predicates: &Dictionary<Predicate>,
) -> Result<Ref<Predicate>, ModelError> {
    let id = record.args.first().copied().ok_or(ModelError::MissingArgument {
        domain,
        id: record.id,
        position: 0,
    })?;
    predicates.reference(id)
}

/// The shape of an obligation: which predicate must hold, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoType {
    id: Id,
    tag: String,
    predicate: Ref<Predicate>,
    locations: Vec<Id>,
}

impl PoType {
    /// Reads an obligation type row: args `[predicate, location...]`. The predicate must
    /// be bound in the unit.
    pub fn from_record(
        domain: Domain,
        record: &TaggedRecord,
        predicates: &Dictionary<Predicate>,
    ) -> Result<Self, ModelError> {
        Ok(PoType {
            id: record.id,
            tag: record.tag_key().unwrap_or_default().to_string(),
            predicate: predicate_arg(domain, record, predicates)?,
            locations: record.args.iter().skip(1).copied().collect(),
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn predicate(&self) -> Ref<Predicate> {
        self.predicate
    }

    pub fn locations(&self) -> &[Id] {
        &self.locations
    }
}

/// A predicate a function assumes while its obligations are discharged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalAssumption {
    pub id: Id,
    pub predicate: Ref<Predicate>,
}

impl LocalAssumption {
    pub fn from_record(
        record: &TaggedRecord,
        predicates: &Dictionary<Predicate>,
    ) -> Result<Self, ModelError> {
        let predicate = predicate_arg(Domain::Assumption, record, predicates)?;
        Ok(LocalAssumption { id: record.id, predicate })
    }
}

/// Discharge status of an obligation. Statuses this crate does not know are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoStatus {
    Open,
    Safe,
    Violation,
    DeadCode,
    Other(String),
}

impl PoStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PoStatus::Open => "open",
            PoStatus::Safe => "safe",
            PoStatus::Violation => "violation",
            PoStatus::DeadCode => "dead-code",
            PoStatus::Other(status) => status,
        }
    }

    /// An absent status means the obligation is still open.
    pub fn parse(input: Option<&str>) -> PoStatus {
        match input.map(str::trim) {
            None | Some("") | Some("open") => PoStatus::Open,
            Some("safe") => PoStatus::Safe,
            Some("violation") => PoStatus::Violation,
            Some("dead-code") => PoStatus::DeadCode,
            Some(other) => PoStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for PoStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PoLevel {
    Primary,
    Secondary,
}

/// The call that gives rise to a secondary obligation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub callee: String,
    pub location: Option<Id>,
    /// The index of the callee's API condition this obligation discharges.
    pub api_index: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PoOrigin {
    Primary,
    Secondary(CallSite),
}

/// An obligation attached to a program point of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofObligation {
    id: Id,
    predicate: Ref<Predicate>,
    locations: Vec<Id>,
    status: PoStatus,
    origin: PoOrigin,
}

impl ProofObligation {
    pub fn primary(id: Id, po_type: &PoType, status: PoStatus) -> Self {
        ProofObligation {
            id,
            predicate: po_type.predicate,
            locations: po_type.locations.clone(),
            status,
            origin: PoOrigin::Primary,
        }
    }

    pub fn secondary(id: Id, po_type: &PoType, status: PoStatus, call_site: CallSite) -> Self {
        ProofObligation {
            id,
            predicate: po_type.predicate,
            locations: po_type.locations.clone(),
            status,
            origin: PoOrigin::Secondary(call_site),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn predicate(&self) -> Ref<Predicate> {
        self.predicate
    }

    pub fn locations(&self) -> &[Id] {
        &self.locations
    }

    pub fn status(&self) -> &PoStatus {
        &self.status
    }

    pub fn level(&self) -> PoLevel {
        match self.origin {
            PoOrigin::Primary => PoLevel::Primary,
            PoOrigin::Secondary(_) => PoLevel::Secondary,
        }
    }

    pub fn call_site(&self) -> Option<&CallSite> {
        match &self.origin {
            PoOrigin::Primary => None,
            PoOrigin::Secondary(call_site) => Some(call_site),
        }
    }
}

/// A predicate a function's callers are assumed to guarantee, together with the ids of
/// the obligations that depend on it. The ids are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiAssumption {
    index: Id,
    predicate: Ref<Predicate>,
    ppos: Vec<Id>,
    spos: Vec<Id>,
}

impl ApiAssumption {
    pub fn from_node(
        node: &ApiAssumptionNode,
        predicates: &Dictionary<Predicate>,
    ) -> Result<Self, ModelError> {
        let index = node.predicate_index;
        Ok(ApiAssumption {
            index,
            predicate: predicates.reference(index)?,
            ppos: parse_id_list(Domain::Assumption, index, node.ppos.as_deref())?,
            spos: parse_id_list(Domain::Assumption, index, node.spos.as_deref())?,
        })
    }

    pub fn index(&self) -> Id {
        self.index
    }

    pub fn predicate(&self) -> Ref<Predicate> {
        self.predicate
    }

    pub fn ppos(&self) -> &[Id] {
        &self.ppos
    }

    pub fn spos(&self) -> &[Id] {
        &self.spos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::UnitBuilder;

    fn predicates() -> Dictionary<Predicate> {
        let file = UnitBuilder::new("main.c").expression(1, "lval", "").predicate(4, "nn", "1").build();
        file.predicates().unwrap().clone()
    }

    #[test]
    fn check_po_type() {
        let predicates = predicates();
        let record = TaggedRecord::new(2, &["ppo"], &[4, 10, 11]);
        let po_type = PoType::from_record(Domain::PpoType, &record, &predicates).unwrap();
        assert_eq!(po_type.predicate().id(), 4);
        assert_eq!(po_type.locations(), &[10, 11]);

        let dangling = TaggedRecord::new(3, &["ppo"], &[5]);
        assert_eq!(
            PoType::from_record(Domain::PpoType, &dangling, &predicates),
            Err(ModelError::MissingReference { domain: Domain::Predicate, id: 5 })
        );
        let empty = TaggedRecord::new(3, &["ppo"], &[]);
        assert!(PoType::from_record(Domain::SpoType, &empty, &predicates).is_err());
    }

    #[test]
    fn check_levels() {
        let predicates = predicates();
        let po_type =
            PoType::from_record(Domain::SpoType, &TaggedRecord::new(1, &["s"], &[4]), &predicates)
                .unwrap();
        let primary = ProofObligation::primary(1, &po_type, PoStatus::Open);
        assert_eq!(primary.level(), PoLevel::Primary);
        assert!(primary.call_site().is_none());
        let call_site = CallSite { callee: "memcpy".into(), location: Some(3), api_index: 2 };
        let secondary = ProofObligation::secondary(1, &po_type, PoStatus::Safe, call_site);
        assert_eq!(secondary.level(), PoLevel::Secondary);
        assert_eq!(secondary.call_site().unwrap().callee, "memcpy");
        assert_eq!(secondary.level().to_string(), "secondary");
    }

    #[test]
    fn check_statuses() {
        assert_eq!(PoStatus::parse(None), PoStatus::Open);
        assert_eq!(PoStatus::parse(Some("dead-code")), PoStatus::DeadCode);
        let other = PoStatus::parse(Some("delegated"));
        assert_eq!(other, PoStatus::Other("delegated".into()));
        assert_eq!(other.as_str(), "delegated");
        assert_eq!(serde_json::to_string(&PoStatus::Violation).unwrap(), r#""violation""#);
    }

    #[test]
    fn check_api_assumption_lists() {
        let predicates = predicates();
        let node = ApiAssumptionNode {
            predicate_index: 4,
            ppos: Some("3,4".into()),
            spos: Some(String::new()),
        };
        let assumption = ApiAssumption::from_node(&node, &predicates).unwrap();
        assert_eq!(assumption.ppos(), &[3, 4]);
        assert!(assumption.spos().is_empty());

        let node = ApiAssumptionNode { predicate_index: 4, ppos: None, spos: Some("7 8".into()) };
        let assumption = ApiAssumption::from_node(&node, &predicates).unwrap();
        assert!(assumption.ppos().is_empty());
        assert_eq!(assumption.spos(), &[7, 8]);

        let node = ApiAssumptionNode { predicate_index: 6, ppos: None, spos: None };
        assert!(ApiAssumption::from_node(&node, &predicates).is_err());
    }
}
