// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The raw unit of input.

use crate::error::{Domain, ModelError};
use cdict_metadata::{RecordNode, split_integers};

/// Record ids, as written by the analyzer.
pub type Id = i64;

/// One row of an indexed table: an id, the tag tokens and the integer arguments.
/// The first tag token selects the variant the record describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRecord {
    pub id: Id,
    pub tag_tokens: Vec<String>,
    pub args: Vec<i64>,
}

impl TaggedRecord {
    pub fn new<T: AsRef<str>>(id: Id, tags: &[T], args: &[i64]) -> Self {
        TaggedRecord {
            id,
            tag_tokens: tags.iter().map(|t| t.as_ref().to_string()).collect(),
            args: args.to_vec(),
        }
    }

    /// Parses a wire row. Empty tag or argument strings give empty lists; an argument
    /// that is not an integer fails the record.
    pub fn from_node(domain: Domain, node: &RecordNode) -> Result<Self, ModelError> {
        let args = node.arguments().map_err(|_| ModelError::MalformedInteger {
            domain,
            id: node.index,
            text: node.args.clone(),
        })?;
        Ok(TaggedRecord { id: node.index, tag_tokens: node.tag_tokens(), args })
    }

    /// The token that selects the variant of this record.
    pub fn tag_key(&self) -> Option<&str> {
        self.tag_tokens.first().map(String::as_str).filter(|t| !t.is_empty())
    }
}

/// Parses an optional delimited integer list, e.g. the obligation ids of an API assumption.
/// An absent or empty list is empty.
pub fn parse_id_list(domain: Domain, id: Id, text: Option<&str>) -> Result<Vec<Id>, ModelError> {
    match text {
        None => Ok(Vec::new()),
        Some(text) => split_integers(text).map_err(|_| ModelError::MalformedInteger {
            domain,
            id,
            text: text.to_string(),
        }),
    }
}
