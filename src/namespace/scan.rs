use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use glob::{glob_with, MatchOptions, Pattern};
use tracing::{debug, warn};
use crate::error::{DocSealError, Result};
use crate::naming::NamingRule;
use super::entry::{sort_key, DocumentEntry, RecordEntry};

/// One snapshot of the documents and candidate records under a root.
#[derive(Debug, Clone)]
pub struct Namespace {
    root: PathBuf,
    documents: Vec<DocumentEntry>,
    records: Vec<RecordEntry>,
    document_names: HashSet<String>,
    record_names: HashSet<String>,
}

impl Namespace {
    pub fn scan(root: impl AsRef<Path>, rule: &NamingRule, recursive: bool) -> Result<Self> {
        let root = root.as_ref();
        check_root(root)?;

        let pattern = if recursive { "**/*" } else { "*" };
        let pattern = Path::new(&Pattern::escape(&root.to_string_lossy())).join(pattern);
        let pattern_str = pattern.to_string_lossy();

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let mut documents = Vec::new();
        let mut records = Vec::new();

        for entry in glob_with(&pattern_str, options)
            .map_err(|e| DocSealError::Listing(e.to_string()))?
        {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let Some(name) = relative_name(root, &path) else {
                warn!("Skipping non UTF-8 path: {}", path.display());
                continue;
            };

            let metadata = match fs::metadata(&path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            if rule.is_record(&name) {
                if rule.is_alternate_record(&name) {
                    records.push(RecordEntry::alternate(name));
                } else {
                    records.push(RecordEntry::new(name));
                }
            } else if rule.is_document(&name) {
                documents.push(DocumentEntry::from_metadata(name, &metadata));
            }
        }

        debug!(
            "Scanned {}: {} documents, {} records",
            root.display(),
            documents.len(),
            records.len()
        );

        Ok(Self::from_parts(root, documents, records))
    }

    pub fn from_parts(
        root: impl Into<PathBuf>,
        mut documents: Vec<DocumentEntry>,
        mut records: Vec<RecordEntry>,
    ) -> Self {
        documents.sort_by_cached_key(|d| sort_key(&d.name));
        records.sort_by_cached_key(|r| sort_key(&r.name));

        let document_names = documents.iter().map(|d| d.name.clone()).collect();
        let record_names = records.iter().map(|r| r.name.clone()).collect();

        Self {
            root: root.into(),
            documents,
            records,
            document_names,
            record_names,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &[DocumentEntry] {
        &self.documents
    }

    pub fn records(&self) -> &[RecordEntry] {
        &self.records
    }

    pub fn has_document(&self, name: &str) -> bool {
        self.document_names.contains(name)
    }

    pub fn has_record(&self, name: &str) -> bool {
        self.record_names.contains(name)
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Resolves the document a record belongs to.
    ///
    /// Probes the rule's fixed candidate order first, then falls back to any
    /// listed document with the same base and a differently-cased extension
    /// (first in sorted order).
    pub fn resolve_document(&self, rule: &NamingRule, record: &str) -> Option<String> {
        if let Some(found) = rule.document_name_for(record, |candidate| self.has_document(candidate)) {
            return Some(found);
        }

        let base = rule.record_base(record)?;
        self.documents
            .iter()
            .find(|d| {
                rule.document_extension(&d.name)
                    .map(|ext| d.name.len() == base.len() + ext.len() + 1 && d.name.starts_with(base))
                    .unwrap_or(false)
            })
            .map(|d| d.name.clone())
    }
}

fn check_root(root: &Path) -> Result<()> {
    match fs::metadata(root) {
        Ok(m) if m.is_dir() => Ok(()),
        Ok(_) => Err(DocSealError::RootNotDirectory(root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocSealError::RootNotFound(root.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
