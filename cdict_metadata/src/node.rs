// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use std::num::ParseIntError;

/// One row of an indexed table, as the analyzer writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordNode {
    pub index: i64,
    /// Delimited tag tokens. The first token selects the variant.
    #[serde(default)]
    pub tags: String,
    /// Delimited integer arguments.
    #[serde(default)]
    pub args: String,
}

impl RecordNode {
    pub fn new<T: Into<String>, A: Into<String>>(index: i64, tags: T, args: A) -> Self {
        RecordNode { index, tags: tags.into(), args: args.into() }
    }

    pub fn tag_tokens(&self) -> Vec<String> {
        split_tags(&self.tags)
    }

    pub fn arguments(&self) -> Result<Vec<i64>, ParseIntError> {
        split_integers(&self.args)
    }
}

fn is_delimiter(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

/// Split a tag string into tokens. Commas and whitespace are both delimiters.
///
/// Tag tokens are positional, so a blank field between two commas is kept as an empty
/// token instead of shifting the tokens after it. A blank string yields no tokens.
pub fn split_tags(tags: &str) -> Vec<String> {
    if tags.trim().is_empty() {
        return Vec::new();
    }
    let mut tokens = Vec::new();
    for field in tags.split(',') {
        let before = tokens.len();
        tokens.extend(field.split_whitespace().map(str::to_string));
        if tokens.len() == before {
            tokens.push(String::new());
        }
    }
    tokens
}

/// Split a delimited integer string, e.g. `"3,4"` or `"3 4"`. An empty string yields
/// an empty list.
pub fn split_integers(args: &str) -> Result<Vec<i64>, ParseIntError> {
    args.split(is_delimiter).filter(|t| !t.is_empty()).map(str::parse::<i64>).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_split_tags() {
        assert_eq!(split_tags("tint,iint"), vec!["tint", "iint"]);
        assert_eq!(split_tags(" io  plus, iint "), vec!["io", "plus", "iint"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags("  ").is_empty());
    }

    #[test]
    fn check_split_tags_keeps_positions() {
        assert_eq!(split_tags("io,,iint"), vec!["io", "", "iint"]);
        assert_eq!(split_tags("tint,iint,"), vec!["tint", "iint", ""]);
        assert_eq!(split_tags(",iint"), vec!["", "iint"]);
    }

    #[test]
    fn check_split_integers() {
        assert_eq!(split_integers("3,4").unwrap(), vec![3, 4]);
        assert_eq!(split_integers("3, 4 ,5").unwrap(), vec![3, 4, 5]);
        assert_eq!(split_integers("-1").unwrap(), vec![-1]);
        assert!(split_integers("").unwrap().is_empty());
        assert!(split_integers("3,x").is_err());
    }

    #[test]
    fn check_missing_fields_deserialize_empty() {
        let node: RecordNode = serde_json::from_str(r#"{"index": 4}"#).unwrap();
        assert!(node.tag_tokens().is_empty());
        assert!(node.arguments().unwrap().is_empty());
    }
}
