// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::dictionary::{Dictionary, Ref};
use crate::error::{Domain, ModelError};
use crate::obligation::{ApiAssumption, LocalAssumption, PoLevel, PoType, ProofObligation};
use crate::record::Id;
use crate::typ::CType;
use std::collections::BTreeMap;

/// A function of a source file, with everything the function-level families attach to it.
#[derive(Debug, Clone)]
pub struct CFunction {
    name: String,
    signature: Option<Ref<CType>>,
    pub(crate) ppo_types: Dictionary<PoType>,
    pub(crate) spo_types: Dictionary<PoType>,
    pub(crate) assumptions: Dictionary<LocalAssumption>,
    pub(crate) ppos: BTreeMap<Id, ProofObligation>,
    pub(crate) spos: BTreeMap<Id, ProofObligation>,
    pub(crate) api_assumptions: BTreeMap<Id, ApiAssumption>,
}

impl CFunction {
    pub fn new(name: &str, signature: Option<Ref<CType>>) -> Self {
        CFunction {
            name: name.to_string(),
            signature,
            ppo_types: Dictionary::new(Domain::PpoType),
            spo_types: Dictionary::new(Domain::SpoType),
            assumptions: Dictionary::new(Domain::Assumption),
            ppos: BTreeMap::new(),
            spos: BTreeMap::new(),
            api_assumptions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function type in the unit's type dictionary, if the signature is known.
    pub fn signature(&self) -> Option<Ref<CType>> {
        self.signature
    }

    pub fn get_ppo_type(&self, id: Id) -> Result<&PoType, ModelError> {
        self.ppo_types.get(id)
    }

    pub fn get_spo_type(&self, id: Id) -> Result<&PoType, ModelError> {
        self.spo_types.get(id)
    }

    pub fn assumptions(&self) -> impl Iterator<Item = &LocalAssumption> {
        self.assumptions.iter().map(|(_, assumption)| assumption)
    }

    pub fn ppos(&self) -> impl Iterator<Item = &ProofObligation> {
        self.ppos.values()
    }

    pub fn spos(&self) -> impl Iterator<Item = &ProofObligation> {
        self.spos.values()
    }

    /// Looks up an obligation by level and id.
    pub fn get_po(&self, level: PoLevel, id: Id) -> Option<&ProofObligation> {
        match level {
            PoLevel::Primary => self.ppos.get(&id),
            PoLevel::Secondary => self.spos.get(&id),
        }
    }

    pub fn api_assumptions(&self) -> impl Iterator<Item = &ApiAssumption> {
        self.api_assumptions.values()
    }

    pub fn get_api_assumption(&self, index: Id) -> Option<&ApiAssumption> {
        self.api_assumptions.get(&index)
    }
}
