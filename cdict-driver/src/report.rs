// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! What a read resolved to: printed to the terminal and optionally written as JSON.

use crate::util::{error, info_operation, plural, warning};
use anyhow::{Context, Result};
use cdict_metadata::FileFamily;
use cdict_model::{Application, BindStats, Domain, ReportedError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Version of the JSON report layout.
const FILE_VERSION: &str = "0.1";

/// Obligation counts by level (`primary`, `secondary`) and then by status.
pub type ObligationCounts = BTreeMap<String, BTreeMap<String, usize>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Summary {
    pub file_version: &'static str,
    pub source: String,
    pub documents: BTreeMap<FileFamily, usize>,
    pub units: usize,
    pub functions: usize,
    pub stats: BTreeMap<Domain, BindStats>,
    pub obligations: ObligationCounts,
    pub api_assumptions: usize,
    pub errors: Vec<ReportedError>,
}

impl Summary {
    pub fn new(
        source: String,
        documents: BTreeMap<FileFamily, usize>,
        application: &Application,
        errors: Vec<ReportedError>,
    ) -> Self {
        let mut functions = 0;
        let mut api_assumptions = 0;
        let mut obligations = ObligationCounts::new();
        for function in application.files().flat_map(|file| file.functions()) {
            functions += 1;
            api_assumptions += function.api_assumptions().count();
            for po in function.ppos().chain(function.spos()) {
                *obligations
                    .entry(po.level().to_string())
                    .or_default()
                    .entry(po.status().as_str().to_string())
                    .or_default() += 1;
            }
        }
        Summary {
            file_version: FILE_VERSION,
            source,
            documents,
            units: application.files().count(),
            functions,
            stats: application.stats().clone(),
            obligations,
            api_assumptions,
            errors,
        }
    }

    /// Number of documents of the given granularity.
    fn document_count(&self, function_level: bool) -> usize {
        self.documents
            .iter()
            .filter(|(family, _)| family.is_function_level() == function_level)
            .map(|(_, count)| count)
            .sum()
    }

    fn obligation_line(&self, level: &str) -> Option<String> {
        let statuses = self.obligations.get(level)?;
        let total: usize = statuses.values().sum();
        let detail: Vec<String> =
            statuses.iter().map(|(status, count)| format!("{count} {status}")).collect();
        Some(format!("{} ({})", plural(total, &format!("{level} obligation")), detail.join(", ")))
    }

    pub fn print(&self, verbose: bool) {
        info_operation(
            "Read",
            &format!(
                "{} and {} from `{}`",
                plural(self.document_count(false), "unit document"),
                plural(self.document_count(true), "function document"),
                self.source
            ),
        );
        info_operation(
            "Resolved",
            &format!("{}, {}", plural(self.units, "unit"), plural(self.functions, "function")),
        );
        for level in ["primary", "secondary"] {
            if let Some(line) = self.obligation_line(level) {
                info_operation("Linked", &line);
            }
        }
        if self.api_assumptions > 0 {
            info_operation("Linked", &plural(self.api_assumptions, "API assumption"));
        }

        if verbose {
            for (domain, stats) in &self.stats {
                println!(
                    "  {domain:<12} constructed {:>6}  bound {:>6}  failed {:>6}",
                    stats.constructed, stats.bound, stats.failed
                );
            }
            for reported in &self.errors {
                error(&format!("{}: {}", reported.origin, reported.message));
            }
        }

        if !self.errors.is_empty() {
            warning(&format!(
                "{} reported{}",
                plural(self.errors.len(), "error"),
                if verbose { "" } else { ", use --verbose to list them" }
            ));
        }
    }

    /// Write the summary as pretty printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let out_file = File::create(path)
            .with_context(|| format!("failed to create report `{}`", path.display()))?;
        let writer = BufWriter::new(out_file);
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("failed to write report `{}`", path.display()))?;
        Ok(())
    }
}
