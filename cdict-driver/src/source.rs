// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Analysis documents stored as JSON files under one directory.

use anyhow::{Context, Result};
use cdict_metadata::FileFamily;
use cdict_model::{AnalysisSource, SourceResult};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Every `*_<family>.json` file found under a root directory.
///
/// A document's origin is its path relative to the root, with `/` separators.
#[derive(Debug)]
pub struct FsSource {
    root: PathBuf,
    documents: BTreeMap<FileFamily, BTreeMap<String, PathBuf>>,
}

impl FsSource {
    /// Scan `root` recursively. Entries that cannot be read are skipped with a warning.
    pub fn new(root: &Path) -> Result<FsSource> {
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to access `{}`", root.display()))?;
        let mut documents: BTreeMap<FileFamily, BTreeMap<String, PathBuf>> = BTreeMap::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(%error, "skip_entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(family) = family_of(entry.path()) else {
                continue;
            };
            let origin = origin_of(&root, entry.path());
            debug!(%family, %origin, "found_document");
            documents.entry(family).or_default().insert(origin, entry.into_path());
        }
        Ok(FsSource { root, documents })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of documents found for each family, including families with none.
    pub fn document_counts(&self) -> BTreeMap<FileFamily, usize> {
        FileFamily::iter()
            .map(|family| (family, self.documents.get(&family).map_or(0, BTreeMap::len)))
            .collect()
    }
}

/// The family a document belongs to, from its file name.
fn family_of(path: &Path) -> Option<FileFamily> {
    let name = path.file_name()?.to_str()?;
    FileFamily::iter().find(|family| {
        let suffix = family.suffix();
        name.len() > suffix.len() && name.ends_with(&suffix)
    })
}

fn origin_of(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl AnalysisSource for FsSource {
    fn label(&self) -> String {
        self.root.display().to_string()
    }

    fn origins(&self, family: FileFamily) -> Vec<String> {
        self.documents.get(&family).map(|docs| docs.keys().cloned().collect()).unwrap_or_default()
    }

    fn load<D: DeserializeOwned>(&self, family: FileFamily, origin: &str) -> SourceResult<D> {
        let path = self
            .documents
            .get(&family)
            .and_then(|docs| docs.get(origin))
            .ok_or_else(|| format!("no {family} document at `{origin}`"))?;
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdict_metadata::{CDictDoc, PrdDoc};
    use cdict_model::{Application, ErrorsBundle, NoProgress, ReadConfig, display_type};
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn check_family_of() {
        assert_eq!(family_of(Path::new("a/main_cdict.json")), Some(FileFamily::CDict));
        assert_eq!(family_of(Path::new("main_f_ppo.json")), Some(FileFamily::Ppo));
        assert_eq!(family_of(Path::new("_cfun.json")), None);
        assert_eq!(family_of(Path::new("main_cdict.xml")), None);
        assert_eq!(family_of(Path::new("notes.json")), None);
    }

    #[test]
    fn check_scan() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main_cdict.json", r#"{"file": "main.c"}"#);
        write(dir.path(), "lib_cdict.json", r#"{"file": "lib.c"}"#);
        write(dir.path(), "src/functions/main_f_ppo.json", r#"{"file": "main.c"}"#);
        write(dir.path(), "README.md", "");

        let source = FsSource::new(dir.path()).unwrap();
        assert_eq!(source.origins(FileFamily::CDict), vec!["lib_cdict.json", "src/main_cdict.json"]);
        assert_eq!(source.origins(FileFamily::Ppo), vec!["src/functions/main_f_ppo.json"]);
        assert!(source.origins(FileFamily::Api).is_empty());
        assert_eq!(source.document_counts()[&FileFamily::CDict], 2);
        assert_eq!(source.document_counts()[&FileFamily::Prd], 0);

        let doc: CDictDoc = source.load(FileFamily::CDict, "src/main_cdict.json").unwrap();
        assert_eq!(doc.file, "main.c");
        assert!(source.load::<PrdDoc>(FileFamily::Prd, "src/main_cdict.json").is_err());
    }

    #[test]
    fn check_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsSource::new(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn check_read_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "main_cfile.json", r#"{"file": "main.c", "compinfos": [], "fieldinfos": []}"#);
        write(
            root,
            "main_cdict.json",
            r#"{"file": "main.c",
                "types": [{"index": 1, "tags": "tint,iint"}, {"index": 2, "tags": "tptr", "args": "1"}],
                "expressions": [{"index": 1, "tags": "lval", "args": "1"}],
                "lvals": [{"index": 1, "tags": "var,p"}]}"#,
        );
        write(root, "main_f_cfun.json", r#"{"file": "main.c", "function": "f", "type_index": 2}"#);
        write(
            root,
            "main_prd.json",
            r#"{"file": "main.c", "predicates": [{"index": 1, "tags": "nn", "args": "1"}]}"#,
        );
        write(
            root,
            "main_f_pod.json",
            r#"{"file": "main.c", "function": "f", "ppo_types": [{"index": 1, "tags": "p", "args": "1,4"}]}"#,
        );
        write(
            root,
            "main_f_ppo.json",
            r#"{"file": "main.c", "function": "f", "proof_obligations": [{"id": 1, "status": "safe"}]}"#,
        );
        write(root, "main_f_spo.json", "{ not json");

        let source = FsSource::new(root).unwrap();
        let errors = ErrorsBundle::new();
        let application = Application::read(&source, &ReadConfig::sequential(), &errors, &NoProgress);

        let file = application.get_file("main.c").unwrap();
        assert_eq!(display_type(file, 2), "((int) *)");
        assert_eq!(application.get_function("main.c", "f").unwrap().ppos().count(), 1);
        assert_eq!(errors.messages_for("main_f_spo.json").len(), 1);
        assert_eq!(errors.messages_for(&source.label()), vec!["no api files found"]);
        assert_eq!(errors.len(), 2);
    }
}
