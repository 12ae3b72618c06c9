// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Translation units.
//!
//! A unit is assembled in two steps. A [PendingFile] collects the constructed records of
//! the file-level families. Binding it produces the [CFile], whose dictionaries only hold
//! bound variants, and to which the function-level families are then linked.

use crate::bind::{BindFailure, BindOrder, BindScope, BindStats, Unbound, bind_all};
use crate::dictionary::{Dictionary, Ref};
use crate::error::{Domain, ErrorSink, ModelError};
use crate::function::CFunction;
use crate::obligation::{
    ApiAssumption, CallSite, LocalAssumption, PoStatus, PoType, ProofObligation,
};
use crate::predicate::{Predicate, PredicateHead, build_predicate};
use crate::record::{Id, TaggedRecord};
use crate::term::{Expression, LValue, Term};
use crate::typ::{CType, CompInfo, FieldInfo, FunArgs, FunArgsHead, TypeHead, build_type};
use cdict_metadata::{
    ApiDoc, CDictDoc, CFileDoc, CFunDoc, FileFamily, FunctionLevel, PodDoc, PpoDoc, PrdDoc,
    RecordNode, SpoDoc,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Statistics of one unit, per domain.
pub type UnitStats = BTreeMap<Domain, BindStats>;

/// Families every unit must have records in. Without symbols nothing in the unit can be
/// bound, and without predicates no obligation can be linked.
const REQUIRED_FAMILIES: [FileFamily; 2] = [FileFamily::CDict, FileFamily::Prd];

/// Constructs every row of `nodes` into `dictionary`. Rows that fail are reported and
/// skipped.
fn construct<V>(
    dictionary: &mut Dictionary<V>,
    nodes: &[RecordNode],
    origin: &str,
    errors: &dyn ErrorSink,
    build: impl Fn(TaggedRecord) -> Result<(Id, V), ModelError>,
) {
    let domain = dictionary.domain();
    for node in nodes {
        let result = TaggedRecord::from_node(domain, node)
            .and_then(&build)
            .and_then(|(id, value)| dictionary.insert(id, value));
        if let Err(error) = result {
            errors.report(origin, &error);
        }
    }
}

fn keyed<V>(record: TaggedRecord, build: impl FnOnce(TaggedRecord) -> V) -> (Id, V) {
    (record.id, build(record))
}

fn report_failures(origin: &str, failures: Vec<BindFailure>, errors: &dyn ErrorSink) {
    for failure in failures {
        errors.add_error(origin, &failure.to_string());
    }
}

/// The constructed, not yet bound, records of a unit.
pub struct PendingFile {
    name: String,
    origins: BTreeMap<FileFamily, String>,
    records: BTreeMap<FileFamily, usize>,
    compinfos: Dictionary<CompInfo>,
    fieldinfos: Vec<TaggedRecord>,
    types: Dictionary<Unbound<TypeHead>>,
    funargs: Dictionary<Unbound<FunArgsHead>>,
    expressions: Dictionary<Expression>,
    lvalues: Dictionary<LValue>,
    predicates: Option<Dictionary<Unbound<PredicateHead>>>,
    signatures: BTreeMap<String, Option<Id>>,
}

impl PendingFile {
    pub fn new(name: &str) -> Self {
        PendingFile {
            name: name.to_string(),
            origins: BTreeMap::new(),
            records: BTreeMap::new(),
            compinfos: Dictionary::new(Domain::Struct),
            fieldinfos: Vec::new(),
            types: Dictionary::new(Domain::Type),
            funargs: Dictionary::new(Domain::Funargs),
            expressions: Dictionary::new(Domain::Expression),
            lvalues: Dictionary::new(Domain::Lvalue),
            predicates: None,
            signatures: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows read for `family`, over all its documents.
    pub fn record_count(&self, family: FileFamily) -> usize {
        self.records.get(&family).copied().unwrap_or_default()
    }

    /// The required families this unit has no records of.
    pub fn missing_families(&self) -> Vec<FileFamily> {
        REQUIRED_FAMILIES.into_iter().filter(|family| self.record_count(*family) == 0).collect()
    }

    fn origin(&self, family: FileFamily) -> String {
        self.origins.get(&family).cloned().unwrap_or_else(|| self.name.clone())
    }

    fn record_origin(&mut self, family: FileFamily, origin: &str, rows: usize) {
        self.origins.entry(family).or_insert_with(|| origin.to_string());
        *self.records.entry(family).or_default() += rows;
    }

    /// Adds the struct and union declarations of the file.
    pub fn add_cfile(&mut self, origin: &str, doc: &CFileDoc, errors: &dyn ErrorSink) {
        self.record_origin(FileFamily::CFile, origin, doc.compinfos.len() + doc.fieldinfos.len());
        construct(&mut self.compinfos, &doc.compinfos, origin, errors, |record| {
            CompInfo::from_record(&record).map(|compinfo| (compinfo.key(), compinfo))
        });
        for node in &doc.fieldinfos {
            match TaggedRecord::from_node(Domain::Struct, node) {
                Ok(record) => self.fieldinfos.push(record),
                Err(error) => errors.report(origin, &error),
            }
        }
    }

    /// Adds the symbol dictionary: types, argument lists, expressions and lvalues.
    pub fn add_cdict(&mut self, origin: &str, doc: &CDictDoc, errors: &dyn ErrorSink) {
        let rows = doc.types.len() + doc.funargs.len() + doc.expressions.len() + doc.lvals.len();
        self.record_origin(FileFamily::CDict, origin, rows);
        construct(&mut self.types, &doc.types, origin, errors, |record| {
            build_type(record).map(|unbound| (unbound.id(), unbound))
        });
        construct(&mut self.funargs, &doc.funargs, origin, errors, |record| {
            Ok(keyed(record, |record| Unbound::new(record, FunArgsHead)))
        });
        construct(&mut self.expressions, &doc.expressions, origin, errors, |record| {
            Ok(keyed(record, |record| Expression::from(Term::from(record))))
        });
        construct(&mut self.lvalues, &doc.lvals, origin, errors, |record| {
            Ok(keyed(record, |record| LValue::from(Term::from(record))))
        });
    }

    /// Declares a function of the file.
    pub fn add_function(&mut self, origin: &str, doc: &CFunDoc, errors: &dyn ErrorSink) {
        self.record_origin(FileFamily::CFun, origin, 1);
        if self.signatures.contains_key(&doc.function) {
            errors.add_error(origin, &format!("duplicate function `{}`", doc.function));
            return;
        }
        self.signatures.insert(doc.function.clone(), doc.type_index);
    }

    /// Adds the predicate dictionary.
    pub fn add_predicates(&mut self, origin: &str, doc: &PrdDoc, errors: &dyn ErrorSink) {
        self.record_origin(FileFamily::Prd, origin, doc.predicates.len());
        let predicates = self.predicates.get_or_insert_with(|| Dictionary::new(Domain::Predicate));
        construct(predicates, &doc.predicates, origin, errors, |record| {
            build_predicate(record).map(|unbound| (unbound.id(), unbound))
        });
    }

    /// Attaches the field table to the struct descriptors. A field needs its descriptor
    /// and its type to exist.
    fn attach_fields(&mut self, errors: &dyn ErrorSink) {
        let origin = self.origin(FileFamily::CFile);
        for record in std::mem::take(&mut self.fieldinfos) {
            let field = |position: usize| {
                record.args.get(position).copied().ok_or(ModelError::MissingArgument {
                    domain: Domain::Struct,
                    id: record.id,
                    position,
                })
            };
            let result = field(0).and_then(|key| {
                let typ = field(1)?;
                if !self.types.contains(typ) {
                    return Err(ModelError::MissingReference { domain: Domain::Type, id: typ });
                }
                let compinfo = self.compinfos.get_mut(key)?;
                let name = record.tag_key().unwrap_or_default().to_string();
                compinfo.add_field(FieldInfo { name, typ: Ref::new(typ) });
                Ok(())
            });
            if let Err(error) = result {
                errors.report(&origin, &error);
            }
        }
    }

    /// Binds every constructed record. Records that fail are reported against the document
    /// they came from and left out of the unit.
    ///
    /// A required family without records is reported once against the unit. What depends
    /// on it is skipped without further errors: struct fields and function signatures
    /// need the symbol dictionary, and the predicates need both families. A unit without
    /// bound predicates gets no obligations linked.
    pub fn bind(mut self, order: BindOrder, errors: &dyn ErrorSink) -> (CFile, UnitStats) {
        let missing = self.missing_families();
        for family in &missing {
            let error = ModelError::MissingFamily { unit: self.name.clone(), family: *family };
            errors.report(&self.name, &error);
        }
        let has_symbols = !missing.contains(&FileFamily::CDict);
        if has_symbols {
            self.attach_fields(errors);
        } else {
            self.fieldinfos.clear();
        }
        let cdict_origin = self.origin(FileFamily::CDict);
        let prd_origin = self.origin(FileFamily::Prd);
        let PendingFile {
            name,
            origins,
            compinfos,
            types,
            funargs,
            expressions,
            lvalues,
            predicates,
            signatures,
            ..
        } = self;

        let mut stats = UnitStats::new();
        let complete = |len| BindStats { constructed: len, bound: len, failed: 0 };
        stats.insert(Domain::Struct, complete(compinfos.len()));
        stats.insert(Domain::Expression, complete(expressions.len()));
        stats.insert(Domain::Lvalue, complete(lvalues.len()));

        let type_ids = types.ids();
        let funargs_ids = funargs.ids();
        let scope = BindScope::new(&type_ids, &funargs_ids, &compinfos, &expressions, &lvalues);

        let (types, failures, type_stats) = bind_all::<CType>(types, &scope, order);
        report_failures(&cdict_origin, failures, errors);
        stats.insert(Domain::Type, type_stats);

        let (funargs, failures, funargs_stats) = bind_all::<FunArgs>(funargs, &scope, order);
        report_failures(&cdict_origin, failures, errors);
        stats.insert(Domain::Funargs, funargs_stats);

        let predicates = predicates.filter(|_| missing.is_empty()).map(|predicates| {
            let (predicates, failures, predicate_stats) =
                bind_all::<Predicate>(predicates, &scope, order);
            report_failures(&prd_origin, failures, errors);
            stats.insert(Domain::Predicate, predicate_stats);
            predicates
        });

        let cfun_origin = origins.get(&FileFamily::CFun).cloned().unwrap_or_else(|| name.clone());
        let mut functions = BTreeMap::new();
        for (function, type_index) in signatures {
            let type_index = type_index.filter(|_| has_symbols);
            let signature = match type_index.map(|id| types.reference(id)).transpose() {
                Ok(signature) => signature,
                Err(error) => {
                    errors.report(&cfun_origin, &error);
                    None
                }
            };
            functions.insert(function.clone(), CFunction::new(&function, signature));
        }

        debug!(unit = %name, ?stats, "bound_unit");
        let file = CFile {
            name,
            origins,
            compinfos,
            types,
            funargs,
            expressions,
            lvalues,
            predicates,
            functions,
        };
        (file, stats)
    }
}

/// A bound translation unit.
#[derive(Debug)]
pub struct CFile {
    name: String,
    origins: BTreeMap<FileFamily, String>,
    compinfos: Dictionary<CompInfo>,
    types: Dictionary<CType>,
    funargs: Dictionary<FunArgs>,
    expressions: Dictionary<Expression>,
    lvalues: Dictionary<LValue>,
    predicates: Option<Dictionary<Predicate>>,
    functions: BTreeMap<String, CFunction>,
}

impl CFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The document of `family` this unit was read from.
    pub fn origin(&self, family: FileFamily) -> Option<&str> {
        self.origins.get(&family).map(String::as_str)
    }

    pub fn get_type(&self, id: Id) -> Result<&CType, ModelError> {
        self.types.get(id)
    }

    pub fn get_funargs(&self, id: Id) -> Result<&FunArgs, ModelError> {
        self.funargs.get(id)
    }

    /// Looks up a struct or union by its compinfo key.
    pub fn get_struct(&self, key: Id) -> Result<&CompInfo, ModelError> {
        self.compinfos.get(key)
    }

    pub fn get_expression(&self, id: Id) -> Result<&Expression, ModelError> {
        self.expressions.get(id)
    }

    pub fn get_lvalue(&self, id: Id) -> Result<&LValue, ModelError> {
        self.lvalues.get(id)
    }

    pub fn get_predicate(&self, id: Id) -> Result<&Predicate, ModelError> {
        self.predicates()?.get(id)
    }

    pub fn types(&self) -> &Dictionary<CType> {
        &self.types
    }

    /// The predicate dictionary. Fails if the unit had no predicate document.
    pub fn predicates(&self) -> Result<&Dictionary<Predicate>, ModelError> {
        self.predicates.as_ref().ok_or_else(|| ModelError::MissingFamily {
            unit: self.name.clone(),
            family: FileFamily::Prd,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &CFunction> {
        self.functions.values()
    }

    pub fn get_function(&self, name: &str) -> Result<&CFunction, ModelError> {
        self.functions.get(name).ok_or_else(|| ModelError::UnknownFunction {
            file: self.name.clone(),
            function: name.to_string(),
        })
    }

    /// The function a function-level document belongs to, and the predicates its rows
    /// refer to.
    fn function_scope(
        &mut self,
        function: &str,
    ) -> Result<(&mut CFunction, &Dictionary<Predicate>), ModelError> {
        let CFile { name, predicates, functions, .. } = self;
        let predicates = predicates.as_ref().ok_or_else(|| ModelError::MissingFamily {
            unit: name.clone(),
            family: FileFamily::Prd,
        })?;
        let function = functions.get_mut(function).ok_or_else(|| ModelError::UnknownFunction {
            file: name.clone(),
            function: function.to_string(),
        })?;
        Ok((function, predicates))
    }

    /// Links the obligation dictionary of a function: its primary and secondary obligation
    /// types and its local assumptions.
    pub fn link_pod(
        &mut self,
        origin: &str,
        doc: &PodDoc,
        errors: &dyn ErrorSink,
    ) -> Result<(), ModelError> {
        let (function, predicates) = self.function_scope(doc.function_name())?;
        construct(&mut function.ppo_types, &doc.ppo_types, origin, errors, |record| {
            PoType::from_record(Domain::PpoType, &record, predicates).map(|t| (record.id, t))
        });
        construct(&mut function.spo_types, &doc.spo_types, origin, errors, |record| {
            PoType::from_record(Domain::SpoType, &record, predicates).map(|t| (record.id, t))
        });
        construct(&mut function.assumptions, &doc.assumptions, origin, errors, |record| {
            LocalAssumption::from_record(&record, predicates).map(|a| (record.id, a))
        });
        Ok(())
    }

    /// Links the primary obligations of a function. Each takes its type from the primary
    /// obligation type with the same id.
    pub fn link_ppo(
        &mut self,
        origin: &str,
        doc: &PpoDoc,
        errors: &dyn ErrorSink,
    ) -> Result<(), ModelError> {
        let (function, _) = self.function_scope(doc.function_name())?;
        for node in &doc.proof_obligations {
            let status = PoStatus::parse(node.status.as_deref());
            let result = function.ppo_types.get(node.id).and_then(|po_type| {
                let po = ProofObligation::primary(node.id, po_type, status);
                insert_po(&mut function.ppos, Domain::PpoType, po)
            });
            if let Err(error) = result {
                errors.report(origin, &error);
            }
        }
        Ok(())
    }

    /// Links the secondary obligations of a function, call site by call site.
    pub fn link_spo(
        &mut self,
        origin: &str,
        doc: &SpoDoc,
        errors: &dyn ErrorSink,
    ) -> Result<(), ModelError> {
        let (function, _) = self.function_scope(doc.function_name())?;
        for call_site in &doc.call_sites {
            for condition in &call_site.api_conditions {
                let node = &condition.proof_obligation;
                let status = PoStatus::parse(node.status.as_deref());
                let site = CallSite {
                    callee: call_site.callee.clone(),
                    location: call_site.location,
                    api_index: condition.iapi,
                };
                let result = function.spo_types.get(node.id).and_then(|po_type| {
                    let po = ProofObligation::secondary(node.id, po_type, status, site);
                    insert_po(&mut function.spos, Domain::SpoType, po)
                });
                if let Err(error) = result {
                    errors.report(origin, &error);
                }
            }
        }
        Ok(())
    }

    /// Links the API assumptions of a function.
    pub fn link_api(
        &mut self,
        origin: &str,
        doc: &ApiDoc,
        errors: &dyn ErrorSink,
    ) -> Result<(), ModelError> {
        let (function, predicates) = self.function_scope(doc.function_name())?;
        for node in &doc.assumptions {
            let result = ApiAssumption::from_node(node, predicates).and_then(|assumption| {
                let index = assumption.index();
                if function.api_assumptions.contains_key(&index) {
                    return Err(ModelError::DuplicateId { domain: Domain::Assumption, id: index });
                }
                function.api_assumptions.insert(index, assumption);
                Ok(())
            });
            if let Err(error) = result {
                errors.report(origin, &error);
            }
        }
        Ok(())
    }
}

fn insert_po(
    pos: &mut BTreeMap<Id, ProofObligation>,
    domain: Domain,
    po: ProofObligation,
) -> Result<(), ModelError> {
    let id = po.id();
    if pos.contains_key(&id) {
        return Err(ModelError::DuplicateId { domain, id });
    }
    pos.insert(id, po);
    Ok(())
}
