// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire schema of the analyzer output.
//!
//! The analyzer writes, for every translation unit, one document per file family
//! (see [`FileFamily`]). Each document carries the name of the source file it
//! belongs to and, for function-level families, the function name. Tables inside
//! the documents are lists of [`RecordNode`]s: an index, a delimited tag string and
//! a delimited integer string.

use serde::{Deserialize, Serialize};

pub use family::FileFamily;
pub use node::{RecordNode, split_integers, split_tags};

mod family;
mod node;

/// Anything that belongs to one source file.
pub trait FileLevel {
    fn source_filename(&self) -> &str;
}

/// Anything that belongs to one function of a source file.
pub trait FunctionLevel: FileLevel {
    fn function_name(&self) -> &str;
}

/// `*_cfile.json`: file-level declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFileDoc {
    pub file: String,
    /// Struct and union descriptors: tags `[name]`, args `[ckey, is_struct]`.
    #[serde(default)]
    pub compinfos: Vec<RecordNode>,
    /// Struct and union members: tags `[field name]`, args `[ckey, type index]`.
    #[serde(default)]
    pub fieldinfos: Vec<RecordNode>,
}

/// `*_cdict.json`: the symbol dictionary of a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CDictDoc {
    pub file: String,
    #[serde(default)]
    pub types: Vec<RecordNode>,
    #[serde(default)]
    pub funargs: Vec<RecordNode>,
    #[serde(default)]
    pub expressions: Vec<RecordNode>,
    #[serde(default)]
    pub lvals: Vec<RecordNode>,
}

/// `*_cfun.json`: a function signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFunDoc {
    pub file: String,
    pub function: String,
    /// Index of the function type in the file's symbol dictionary, if known.
    #[serde(default)]
    pub type_index: Option<i64>,
}

/// `*_prd.json`: the predicate dictionary of a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrdDoc {
    pub file: String,
    #[serde(default)]
    pub predicates: Vec<RecordNode>,
}

/// `*_pod.json`: the proof obligation dictionary of a function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodDoc {
    pub file: String,
    pub function: String,
    /// Primary obligation types: args `[predicate, location...]`.
    #[serde(default)]
    pub ppo_types: Vec<RecordNode>,
    /// Secondary obligation types: args `[predicate, location...]`.
    #[serde(default)]
    pub spo_types: Vec<RecordNode>,
    /// Assumptions used to discharge obligations: args `[predicate]`.
    #[serde(default)]
    pub assumptions: Vec<RecordNode>,
}

/// One obligation row of a `ppo` or `spo` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoNode {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

/// `*_ppo.json`: primary proof obligations of a function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PpoDoc {
    pub file: String,
    pub function: String,
    #[serde(default)]
    pub proof_obligations: Vec<PoNode>,
}

/// An obligation a call site must satisfy, tied to the callee's API condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConditionNode {
    pub iapi: i64,
    #[serde(flatten)]
    pub proof_obligation: PoNode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallSiteNode {
    pub callee: String,
    #[serde(default)]
    pub location: Option<i64>,
    #[serde(default)]
    pub api_conditions: Vec<ApiConditionNode>,
}

/// `*_spo.json`: secondary proof obligations of a function, grouped by call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpoDoc {
    pub file: String,
    pub function: String,
    #[serde(default)]
    pub call_sites: Vec<CallSiteNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiAssumptionNode {
    pub predicate_index: i64,
    /// Delimited primary obligation ids. Absent means none.
    #[serde(default)]
    pub ppos: Option<String>,
    /// Delimited secondary obligation ids. Absent means none.
    #[serde(default)]
    pub spos: Option<String>,
}

/// `*_api.json`: the API assumptions of a function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDoc {
    pub file: String,
    pub function: String,
    #[serde(default)]
    pub assumptions: Vec<ApiAssumptionNode>,
}

macro_rules! file_level {
    ($($doc:ty),*) => {
        $(impl FileLevel for $doc {
            fn source_filename(&self) -> &str {
                &self.file
            }
        })*
    };
}

macro_rules! function_level {
    ($($doc:ty),*) => {
        $(impl FunctionLevel for $doc {
            fn function_name(&self) -> &str {
                &self.function
            }
        })*
    };
}

file_level!(CFileDoc, CDictDoc, CFunDoc, PrdDoc, PodDoc, PpoDoc, SpoDoc, ApiDoc);
function_level!(CFunDoc, PodDoc, PpoDoc, SpoDoc, ApiDoc);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_optional_tables() {
        let doc: CDictDoc = serde_json::from_str(r#"{"file": "main.c"}"#).unwrap();
        assert_eq!(doc.source_filename(), "main.c");
        assert!(doc.types.is_empty());
        assert!(doc.expressions.is_empty());
    }

    #[test]
    fn check_api_condition_flattening() {
        let doc: SpoDoc = serde_json::from_str(
            r#"{"file": "main.c", "function": "f",
                "call_sites": [{"callee": "memcpy", "location": 3,
                                "api_conditions": [{"iapi": 1, "id": 7, "status": "open"}]}]}"#,
        )
        .unwrap();
        let condition = &doc.call_sites[0].api_conditions[0];
        assert_eq!(condition.iapi, 1);
        assert_eq!(condition.proof_obligation.id, 7);
        assert_eq!(condition.proof_obligation.status.as_deref(), Some("open"));
        assert_eq!(doc.function_name(), "f");
    }

    #[test]
    fn check_missing_assumption_lists() {
        let doc: ApiDoc = serde_json::from_str(
            r#"{"file": "main.c", "function": "f", "assumptions": [{"predicate_index": 2}]}"#,
        )
        .unwrap();
        assert_eq!(doc.assumptions[0].ppos, None);
        assert_eq!(doc.assumptions[0].spos, None);
    }
}
