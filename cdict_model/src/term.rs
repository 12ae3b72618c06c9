// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Entries of the symbol dictionary: expressions and lvalues.
//!
//! Their structure is not interpreted. They are kept whole at construction, so anything
//! that points at them can be bound right away.

use crate::record::TaggedRecord;
use std::fmt;

/// An uninterpreted symbolic term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    tags: Vec<String>,
    args: Vec<i64>,
}

impl Term {
    pub fn new<T: AsRef<str>>(tags: &[T], args: &[i64]) -> Self {
        Term { tags: tags.iter().map(|t| t.as_ref().to_string()).collect(), args: args.to_vec() }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn args(&self) -> &[i64] {
        &self.args
    }
}

impl From<TaggedRecord> for Term {
    fn from(record: TaggedRecord) -> Self {
        Term { tags: record.tag_tokens, args: record.args }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tags.join(":"))?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(i64::to_string).collect();
            write!(f, "({})", args.join(","))?;
        }
        Ok(())
    }
}

macro_rules! term_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(Term);

        impl $name {
            pub fn term(&self) -> &Term {
                &self.0
            }
        }

        impl From<Term> for $name {
            fn from(term: Term) -> Self {
                $name(term)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

term_newtype!(Expression);
term_newtype!(LValue);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_rendering() {
        assert_eq!(Term::new(&["lval"], &[3]).to_string(), "lval(3)");
        assert_eq!(Term::new(&["const", "cint"], &[1, 12]).to_string(), "const:cint(1,12)");
        assert_eq!(Term::new(&["sizeof"], &[]).to_string(), "sizeof");
        let record = TaggedRecord::new(4, &["var", "p"], &[2]);
        assert_eq!(LValue::from(Term::from(record)).to_string(), "var:p(2)");
    }
}
