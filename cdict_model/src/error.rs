// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::record::Id;
use cdict_metadata::FileFamily;
use serde::Serialize;
use std::sync::Mutex;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;
use tracing::warn;

/// The id spaces records live in. Ids are only unique within one domain of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Type,
    Struct,
    Funargs,
    Expression,
    Lvalue,
    Predicate,
    PpoType,
    SpoType,
    Assumption,
    Function,
}

/// Errors raised while constructing, binding or linking records.
///
/// All of them are recoverable: they are reported against the file the record came from,
/// and the record is left out of the resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("missing {domain} #{id}")]
    MissingReference { domain: Domain, id: Id },
    #[error("{domain} #{id}: no argument at position {position}")]
    MissingArgument { domain: Domain, id: Id, position: usize },
    #[error("{domain} #{id}: no tag token at position {position}")]
    MissingTag { domain: Domain, id: Id, position: usize },
    #[error("{domain} #{id}: empty tag")]
    EmptyTag { domain: Domain, id: Id },
    #[error("duplicate {domain} #{id}")]
    DuplicateId { domain: Domain, id: Id },
    #[error("{domain} #{id}: malformed integer list `{text}`")]
    MalformedInteger { domain: Domain, id: Id, text: String },
    #[error("unknown source file `{0}`")]
    UnknownFile(String),
    #[error("unknown function `{function}` in `{file}`")]
    UnknownFunction { file: String, function: String },
    #[error("no {family} records for `{unit}`")]
    MissingFamily { unit: String, family: FileFamily },
}

/// One reported failure: the file it originates from and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedError {
    pub origin: String,
    pub message: String,
}

/// Collects errors without raising them.
pub trait ErrorSink: Send + Sync {
    fn add_error(&self, origin: &str, message: &str);

    fn report(&self, origin: &str, error: &ModelError) {
        self.add_error(origin, &error.to_string());
    }
}

/// The default [ErrorSink]: keeps every error in arrival order.
#[derive(Debug, Default)]
pub struct ErrorsBundle {
    errors: Mutex<Vec<ReportedError>>,
}

impl ErrorsBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<ReportedError> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The reported messages for one origin.
    pub fn messages_for(&self, origin: &str) -> Vec<String> {
        self.lock().iter().filter(|e| e.origin == origin).map(|e| e.message.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportedError>> {
        // A panic while holding the lock leaves the list intact, so keep using it.
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ErrorSink for ErrorsBundle {
    fn add_error(&self, origin: &str, message: &str) {
        warn!(origin, message, "record_error");
        self.lock().push(ReportedError { origin: origin.to_string(), message: message.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_error_messages() {
        let missing = ModelError::MissingReference { domain: Domain::Expression, id: 9 };
        assert_eq!(missing.to_string(), "missing expression #9");
        let family = ModelError::MissingFamily { unit: "main.c".into(), family: FileFamily::Prd };
        assert_eq!(family.to_string(), "no prd records for `main.c`");
        assert_eq!(Domain::PpoType.to_string(), "ppo-type");
        assert_eq!(Domain::Lvalue.to_string(), "lvalue");
    }

    #[test]
    fn check_errors_bundle() {
        let bundle = ErrorsBundle::new();
        assert!(bundle.is_empty());
        bundle.add_error("a_cdict.json", "first");
        bundle.report("b_prd.json", &ModelError::UnknownFile("b.c".into()));
        bundle.add_error("a_cdict.json", "second");
        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.messages_for("a_cdict.json"), vec!["first", "second"]);
        assert_eq!(bundle.errors()[1].message, "unknown source file `b.c`");
    }
}
