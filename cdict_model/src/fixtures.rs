// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Builders for small units used across the unit tests.

use crate::bind::BindOrder;
use crate::error::ErrorsBundle;
use crate::file::{CFile, PendingFile, UnitStats};
use cdict_metadata::{CDictDoc, CFileDoc, CFunDoc, PrdDoc, RecordNode};

pub(crate) fn rows(rows: &[(i64, &str, &str)]) -> Vec<RecordNode> {
    rows.iter().map(|(index, tags, args)| RecordNode::new(*index, *tags, *args)).collect()
}

/// A unit whose documents are labelled `<stem>_<family>.json`.
pub(crate) struct UnitBuilder {
    stem: String,
    cfile: CFileDoc,
    cdict: CDictDoc,
    prd: Option<PrdDoc>,
    functions: Vec<CFunDoc>,
    order: BindOrder,
}

impl UnitBuilder {
    pub(crate) fn new(name: &str) -> Self {
        let file = name.to_string();
        UnitBuilder {
            stem: name.trim_end_matches(".c").to_string(),
            cfile: CFileDoc { file: file.clone(), ..Default::default() },
            cdict: CDictDoc { file: file.clone(), ..Default::default() },
            prd: Some(PrdDoc { file, ..Default::default() }),
            functions: Vec::new(),
            order: BindOrder::Declaration,
        }
    }

    pub(crate) fn compinfo(mut self, index: i64, tags: &str, args: &str) -> Self {
        self.cfile.compinfos.push(RecordNode::new(index, tags, args));
        self
    }

    pub(crate) fn fieldinfo(mut self, index: i64, tags: &str, args: &str) -> Self {
        self.cfile.fieldinfos.push(RecordNode::new(index, tags, args));
        self
    }

    pub(crate) fn typ(mut self, index: i64, tags: &str, args: &str) -> Self {
        self.cdict.types.push(RecordNode::new(index, tags, args));
        self
    }

    pub(crate) fn funargs(mut self, index: i64, args: &str) -> Self {
        self.cdict.funargs.push(RecordNode::new(index, "", args));
        self
    }

    pub(crate) fn expression(mut self, index: i64, tags: &str, args: &str) -> Self {
        self.cdict.expressions.push(RecordNode::new(index, tags, args));
        self
    }

    pub(crate) fn lval(mut self, index: i64, tags: &str, args: &str) -> Self {
        self.cdict.lvals.push(RecordNode::new(index, tags, args));
        self
    }

    pub(crate) fn predicate(mut self, index: i64, tags: &str, args: &str) -> Self {
        if let Some(prd) = self.prd.as_mut() {
            prd.predicates.push(RecordNode::new(index, tags, args));
        }
        self
    }

    pub(crate) fn without_predicates(mut self) -> Self {
        self.prd = None;
        self
    }

    pub(crate) fn function(mut self, name: &str, type_index: Option<i64>) -> Self {
        self.functions.push(CFunDoc {
            file: self.cfile.file.clone(),
            function: name.to_string(),
            type_index,
        });
        self
    }

    pub(crate) fn order(mut self, order: BindOrder) -> Self {
        self.order = order;
        self
    }

    fn label(&self, family: &str) -> String {
        format!("{}_{family}.json", self.stem)
    }

    pub(crate) fn build_all(self) -> (CFile, UnitStats, ErrorsBundle) {
        let errors = ErrorsBundle::new();
        let mut pending = PendingFile::new(&self.cfile.file);
        pending.add_cfile(&self.label("cfile"), &self.cfile, &errors);
        pending.add_cdict(&self.label("cdict"), &self.cdict, &errors);
        for function in &self.functions {
            pending.add_function(&format!("{}_cfun.json", function.function), function, &errors);
        }
        if let Some(prd) = &self.prd {
            pending.add_predicates(&self.label("prd"), prd, &errors);
        }
        let (file, stats) = pending.bind(self.order, &errors);
        (file, stats, errors)
    }

    pub(crate) fn build_with_errors(self) -> (CFile, ErrorsBundle) {
        let (file, _, errors) = self.build_all();
        (file, errors)
    }

    pub(crate) fn build_with_stats(self) -> (CFile, UnitStats) {
        let (file, stats, _) = self.build_all();
        (file, stats)
    }

    /// Builds the unit, asserting that every record bound. Reports against the unit
    /// itself, such as a required family without records, are allowed.
    pub(crate) fn build(self) -> CFile {
        let name = self.cfile.file.clone();
        let (file, errors) = self.build_with_errors();
        let record_errors: Vec<_> =
            errors.errors().into_iter().filter(|error| error.origin != name).collect();
        assert!(record_errors.is_empty(), "unexpected errors: {record_errors:?}");
        file
    }
}
