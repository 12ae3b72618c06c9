// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! This crate reconstructs the object graph described by the indexed record tables of a
//! C static analyzer.
//!
//! The analyzer output is flat: for each translation unit, tables of records that refer to
//! each other by integer id, possibly in cycles (a struct may contain a pointer to itself).
//! Reading it happens in three stages:
//! 1. Construction. Every record is turned into an [bind::Unbound] instance by the
//!    [registry::VariantRegistry] of its domain. The instance knows its variant but none of
//!    its references.
//! 2. Binding. Each unbound instance is consumed by [bind::Unbound::bind], which resolves
//!    argument ids into typed [dictionary::Ref] handles. A handle only requires its target
//!    to exist, never to be bound already, so cycles and forward references are harmless.
//! 3. Linking. Function-level records (proof obligations, assumptions) are attached to the
//!    bound predicates of their unit.
//!
//! The entry point is [Application::read].

pub mod application;
pub mod bind;
pub mod dictionary;
mod error;
pub mod file;
#[cfg(test)]
mod fixtures;
pub mod function;
pub mod obligation;
pub mod predicate;
pub mod progress;
pub mod record;
pub mod registry;
pub mod term;
pub mod typ;

pub use application::{AnalysisSource, Application, ReadConfig, ReadMode, SourceResult};
pub use bind::{BindOrder, BindStats};
pub use dictionary::{Dictionary, Ref};
pub use error::{Domain, ErrorSink, ErrorsBundle, ModelError, ReportedError};
pub use file::CFile;
pub use function::CFunction;
pub use obligation::{ApiAssumption, CallSite, PoLevel, PoStatus, ProofObligation};
pub use predicate::{Predicate, PredicateKind};
pub use progress::{NoProgress, ProgressSink, SubtaskProgress};
pub use record::{Id, TaggedRecord};
pub use typ::{CType, display_type};
