// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The file families the analyzer emits for each translation unit. The serialized
/// name is also the file name suffix, e.g. `main_cdict.json`.
#[derive(
    Debug,
    Clone,
    Copy,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileFamily {
    /// File-level declarations (struct and union descriptors).
    CFile,
    /// Symbol dictionary: types, function arguments, expressions and lvalues.
    CDict,
    /// Function signatures.
    CFun,
    /// Predicate dictionary.
    Prd,
    /// Proof obligation dictionary of a function.
    Pod,
    /// Primary proof obligations.
    Ppo,
    /// Secondary proof obligations.
    Spo,
    /// API assumptions.
    Api,
}

impl FileFamily {
    /// File name suffix used to recognize documents of this family.
    pub fn suffix(&self) -> String {
        format!("_{}.json", self.as_ref())
    }

    /// Whether documents of this family describe a single function.
    pub fn is_function_level(&self) -> bool {
        match self {
            FileFamily::CFile | FileFamily::CDict | FileFamily::Prd => false,
            FileFamily::CFun
            | FileFamily::Pod
            | FileFamily::Ppo
            | FileFamily::Spo
            | FileFamily::Api => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn check_suffixes() {
        assert_eq!(FileFamily::CDict.suffix(), "_cdict.json");
        assert_eq!(FileFamily::Api.suffix(), "_api.json");
        assert_eq!(FileFamily::from_str("prd").unwrap(), FileFamily::Prd);
        assert_eq!(FileFamily::iter().count(), 8);
    }
}
