//! Mapping between documents and their sidecar records.
//!
//! `report.pdf` is sealed by `report.sha256.txt` in the same directory. The
//! document extension is matched case-insensitively; record suffixes are
//! matched exactly.

use crate::digest::DigestAlgorithm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingRule {
    extensions: Vec<String>,
    algorithm: DigestAlgorithm,
    alternate_suffixes: Vec<String>,
}

impl NamingRule {
    pub fn new<I, S>(extensions: I, algorithm: DigestAlgorithm) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            extensions,
            algorithm,
            alternate_suffixes: Vec::new(),
        }
    }

    /// Additional suffixes accepted when reading, e.g. `.sha256` without `.txt`.
    /// Generation always writes the primary suffix.
    pub fn with_alternate_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let primary = self.record_suffix();
        self.alternate_suffixes = suffixes
            .into_iter()
            .map(|s| {
                let s = s.as_ref().trim();
                if s.starts_with('.') { s.to_string() } else { format!(".{}", s) }
            })
            .filter(|s| s.len() > 1 && *s != primary)
            .collect();
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn alternate_suffixes(&self) -> &[String] {
        &self.alternate_suffixes
    }

    pub fn record_suffix(&self) -> String {
        format!(".{}.txt", self.algorithm.tag())
    }

    pub fn is_record(&self, name: &str) -> bool {
        self.record_base(name).is_some()
    }

    pub fn is_document(&self, name: &str) -> bool {
        !self.is_record(name) && self.document_extension(name).is_some()
    }

    pub fn is_alternate_record(&self, name: &str) -> bool {
        !name.ends_with(&self.record_suffix()) && self.is_record(name)
    }

    /// The recognized extension of `name` as it is spelled on disk.
    pub fn document_extension<'a>(&self, name: &'a str) -> Option<&'a str> {
        let file_name = file_name(name);
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
            .then_some(ext)
    }

    pub fn record_name_for(&self, document: &str) -> Option<String> {
        let base = self.document_base(document)?;
        Some(format!("{}{}", base, self.record_suffix()))
    }

    pub fn alternate_record_names_for(&self, document: &str) -> Vec<String> {
        match self.document_base(document) {
            Some(base) => self
                .alternate_suffixes
                .iter()
                .map(|suffix| format!("{}{}", base, suffix))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Strips the primary or an alternate record suffix.
    pub fn record_base<'a>(&self, record: &'a str) -> Option<&'a str> {
        let primary = self.record_suffix();
        std::iter::once(primary.as_str())
            .chain(self.alternate_suffixes.iter().map(String::as_str))
            .find_map(|suffix| record.strip_suffix(suffix))
            .filter(|base| !file_name(base).is_empty())
    }

    /// Document names probed for a record, in fixed order: for each configured
    /// extension, the lowercase spelling before the uppercase one.
    pub fn candidate_documents(&self, record: &str) -> Vec<String> {
        let Some(base) = self.record_base(record) else {
            return Vec::new();
        };

        let mut candidates = Vec::with_capacity(self.extensions.len() * 2);
        for ext in &self.extensions {
            for variant in [ext.to_ascii_lowercase(), ext.to_ascii_uppercase()] {
                let candidate = format!("{}.{}", base, variant);
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    pub fn document_name_for(&self, record: &str, exists: impl Fn(&str) -> bool) -> Option<String> {
        self.candidate_documents(record)
            .into_iter()
            .find(|candidate| exists(candidate))
    }

    fn document_base<'a>(&self, document: &'a str) -> Option<&'a str> {
        let ext = self.document_extension(document)?;
        Some(&document[..document.len() - ext.len() - 1])
    }
}

impl Default for NamingRule {
    fn default() -> Self {
        Self::new(["pdf"], DigestAlgorithm::Sha256)
    }
}

fn file_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
