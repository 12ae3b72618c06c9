// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The analysis of a whole application: every translation unit, read in stages.

use crate::bind::{BindOrder, BindStats};
use crate::error::{Domain, ErrorSink, ModelError};
use crate::file::{CFile, PendingFile};
use crate::function::CFunction;
use crate::progress::{ProgressSink, SubtaskProgress};
use cdict_metadata::{
    ApiDoc, CDictDoc, CFileDoc, CFunDoc, FileFamily, FileLevel, PodDoc, PpoDoc, PrdDoc, SpoDoc,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Failures of a source are opaque: they are reported by message only.
pub type SourceResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Where the documents of an analysis come from.
pub trait AnalysisSource: Sync {
    /// Names the analysis. Used as the origin of errors that concern no single document.
    fn label(&self) -> String;

    /// The origins of every document of `family`, in a stable order.
    fn origins(&self, family: FileFamily) -> Vec<String>;

    /// Loads the document at `origin`.
    fn load<D: DeserializeOwned>(&self, family: FileFamily, origin: &str) -> SourceResult<D>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Everything on the calling thread.
    Sequential,
    /// Documents are loaded and records bound on a dedicated pool. `None` lets rayon pick
    /// the number of threads.
    Parallel { jobs: Option<usize> },
}

impl ReadMode {
    fn thread_pool(&self) -> Option<ThreadPool> {
        let ReadMode::Parallel { jobs } = self else {
            return None;
        };
        let mut builder = ThreadPoolBuilder::new();
        if let Some(jobs) = jobs {
            builder = builder.num_threads(*jobs);
        }
        match builder.build() {
            Ok(pool) => Some(pool),
            Err(error) => {
                warn!(%error, "thread_pool_unavailable");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadConfig {
    pub mode: ReadMode,
    pub bind_order: BindOrder,
}

impl ReadConfig {
    pub fn sequential() -> Self {
        ReadConfig { mode: ReadMode::Sequential, bind_order: BindOrder::Declaration }
    }

    pub fn parallel(jobs: Option<usize>) -> Self {
        ReadConfig { mode: ReadMode::Parallel { jobs }, bind_order: BindOrder::Parallel }
    }
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self::parallel(None)
    }
}

/// Loads the documents of one family and hands them over one at a time.
struct FamilyReader<'a, S> {
    source: &'a S,
    pool: Option<&'a ThreadPool>,
    errors: &'a dyn ErrorSink,
    progress: &'a dyn ProgressSink,
}

impl<S: AnalysisSource> FamilyReader<'_, S> {
    /// Runs `handle` on every document of `family`. A document that fails to load, or whose
    /// handler fails, is reported against its origin and the next one is processed.
    fn each<D>(
        &self,
        family: FileFamily,
        weight: f64,
        mut handle: impl FnMut(&str, D) -> Result<(), ModelError>,
    ) where
        D: DeserializeOwned + FileLevel + Send,
    {
        let tracker = SubtaskProgress::new(self.progress, weight);
        let origins = self.source.origins(family);
        if origins.is_empty() {
            self.errors.add_error(&self.source.label(), &format!("no {family} files found"));
            tracker.add_progress(100.0);
            return;
        }

        info!(%family, count = origins.len(), "read_family");
        let source = self.source;
        let documents: Vec<SourceResult<D>> = match self.pool {
            Some(pool) => pool.install(|| {
                origins.par_iter().map(|origin| source.load(family, origin)).collect()
            }),
            None => origins.iter().map(|origin| source.load(family, origin)).collect(),
        };

        let increment = 100.0 / origins.len() as f64;
        for (origin, document) in origins.iter().zip(documents) {
            let result = match document {
                Ok(document) => {
                    debug!(%origin, file = document.source_filename(), "read_document");
                    handle(origin, document).map_err(|error| error.to_string())
                }
                Err(error) => Err(error.to_string()),
            };
            if let Err(message) = result {
                self.errors.add_error(origin, &message);
            }
            tracker.add_progress(increment);
        }
    }
}

fn pending_unit<'a>(
    pending: &'a mut BTreeMap<String, PendingFile>,
    name: &str,
) -> Result<&'a mut PendingFile, ModelError> {
    pending.get_mut(name).ok_or_else(|| ModelError::UnknownFile(name.to_string()))
}

/// The unit a function-level document links to. `None` if the unit has no predicate
/// dictionary: that was reported once when it was bound, so its dependents are skipped.
fn linked_unit<'a>(
    files: &'a mut BTreeMap<String, CFile>,
    name: &str,
) -> Result<Option<&'a mut CFile>, ModelError> {
    let file = files.get_mut(name).ok_or_else(|| ModelError::UnknownFile(name.to_string()))?;
    if file.predicates().is_err() {
        debug!(unit = name, "skip_without_predicates");
        return Ok(None);
    }
    Ok(Some(file))
}

/// A fully read analysis.
#[derive(Debug)]
pub struct Application {
    files: BTreeMap<String, CFile>,
    stats: BTreeMap<Domain, BindStats>,
}

impl Application {
    /// Reads every document of `source`.
    ///
    /// Reading never stops at the first failure: each failing record or document is
    /// reported to `errors` and left out, and everything else is read. An empty error
    /// list means every record was resolved.
    pub fn read<S: AnalysisSource>(
        source: &S,
        config: &ReadConfig,
        errors: &dyn ErrorSink,
        progress: &dyn ProgressSink,
    ) -> Application {
        info!(source = %source.label(), ?config, "read_application");
        let pool = config.mode.thread_pool();
        let reader = FamilyReader { source, pool: pool.as_ref(), errors, progress };

        // Stage 1: every family a unit binds against.
        let mut pending: BTreeMap<String, PendingFile> = BTreeMap::new();
        reader.each(FileFamily::CFile, 5.0, |origin, doc: CFileDoc| {
            pending
                .entry(doc.file.clone())
                .or_insert_with(|| PendingFile::new(&doc.file))
                .add_cfile(origin, &doc, errors);
            Ok(())
        });
        reader.each(FileFamily::CDict, 10.0, |origin, doc: CDictDoc| {
            pending_unit(&mut pending, &doc.file)?.add_cdict(origin, &doc, errors);
            Ok(())
        });
        reader.each(FileFamily::CFun, 5.0, |origin, doc: CFunDoc| {
            pending_unit(&mut pending, &doc.file)?.add_function(origin, &doc, errors);
            Ok(())
        });
        reader.each(FileFamily::Prd, 10.0, |origin, doc: PrdDoc| {
            pending_unit(&mut pending, &doc.file)?.add_predicates(origin, &doc, errors);
            Ok(())
        });

        // Stage 2: bind, one unit at a time.
        let mut files = BTreeMap::new();
        let mut stats: BTreeMap<Domain, BindStats> = BTreeMap::new();
        for (name, unit) in pending {
            let order = config.bind_order;
            let (file, unit_stats) = match &pool {
                Some(pool) => pool.install(|| unit.bind(order, errors)),
                None => unit.bind(order, errors),
            };
            for (domain, unit_stats) in unit_stats {
                *stats.entry(domain).or_default() += unit_stats;
            }
            files.insert(name, file);
        }

        // Stage 3: link the function-level families to the bound units.
        reader.each(FileFamily::Pod, 10.0, |origin, doc: PodDoc| {
            match linked_unit(&mut files, &doc.file)? {
                Some(file) => file.link_pod(origin, &doc, errors),
                None => Ok(()),
            }
        });
        reader.each(FileFamily::Ppo, 20.0, |origin, doc: PpoDoc| {
            match linked_unit(&mut files, &doc.file)? {
                Some(file) => file.link_ppo(origin, &doc, errors),
                None => Ok(()),
            }
        });
        reader.each(FileFamily::Spo, 20.0, |origin, doc: SpoDoc| {
            match linked_unit(&mut files, &doc.file)? {
                Some(file) => file.link_spo(origin, &doc, errors),
                None => Ok(()),
            }
        });
        reader.each(FileFamily::Api, 20.0, |origin, doc: ApiDoc| {
            match linked_unit(&mut files, &doc.file)? {
                Some(file) => file.link_api(origin, &doc, errors),
                None => Ok(()),
            }
        });

        info!(units = files.len(), ?stats, "read_application_done");
        Application { files, stats }
    }

    pub fn files(&self) -> impl Iterator<Item = &CFile> {
        self.files.values()
    }

    pub fn get_file(&self, name: &str) -> Result<&CFile, ModelError> {
        self.files.get(name).ok_or_else(|| ModelError::UnknownFile(name.to_string()))
    }

    pub fn get_function(&self, file: &str, function: &str) -> Result<&CFunction, ModelError> {
        self.get_file(file)?.get_function(function)
    }

    /// Construction and bind counts over all units, per domain.
    pub fn stats(&self) -> &BTreeMap<Domain, BindStats> {
        &self.stats
    }
}
