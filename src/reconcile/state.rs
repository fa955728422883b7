use std::collections::HashMap;
use serde::Serialize;
use tabled::Tabled;
use crate::digest::DigestValue;
use crate::namespace::sort_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityState {
    Ok,
    Mismatch,
    MissingDocument,
    MissingRecord,
    UnreadableRecord,
    UnreadableDocument,
}

impl IntegrityState {
    pub const ALL: [IntegrityState; 6] = [
        IntegrityState::Ok,
        IntegrityState::Mismatch,
        IntegrityState::MissingDocument,
        IntegrityState::MissingRecord,
        IntegrityState::UnreadableRecord,
        IntegrityState::UnreadableDocument,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityState::Ok => "OK",
            IntegrityState::Mismatch => "MISMATCH",
            IntegrityState::MissingDocument => "MISSING_DOCUMENT",
            IntegrityState::MissingRecord => "MISSING_RECORD",
            IntegrityState::UnreadableRecord => "UNREADABLE_RECORD",
            IntegrityState::UnreadableDocument => "UNREADABLE_DOCUMENT",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            IntegrityState::Ok => "✓",
            IntegrityState::Mismatch => "✗",
            IntegrityState::MissingDocument => "○",
            IntegrityState::MissingRecord => "○",
            IntegrityState::UnreadableRecord => "⚠",
            IntegrityState::UnreadableDocument => "⚠",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, IntegrityState::Ok)
    }
}

impl std::fmt::Display for IntegrityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationEntry {
    pub state: IntegrityState,
    pub document: Option<String>,
    pub record: Option<String>,
    pub expected: Option<DigestValue>,
    pub actual: Option<DigestValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ClassificationEntry {
    fn new(state: IntegrityState) -> Self {
        Self {
            state,
            document: None,
            record: None,
            expected: None,
            actual: None,
            detail: None,
        }
    }

    pub fn ok(document: &str, record: &str, digest: DigestValue) -> Self {
        Self {
            document: Some(document.to_string()),
            record: Some(record.to_string()),
            expected: Some(digest.clone()),
            actual: Some(digest),
            ..Self::new(IntegrityState::Ok)
        }
    }

    pub fn mismatch(document: &str, record: &str, expected: DigestValue, actual: DigestValue) -> Self {
        Self {
            document: Some(document.to_string()),
            record: Some(record.to_string()),
            expected: Some(expected),
            actual: Some(actual),
            ..Self::new(IntegrityState::Mismatch)
        }
    }

    pub fn missing_record(document: &str, expected_record: &str) -> Self {
        Self {
            document: Some(document.to_string()),
            record: Some(expected_record.to_string()),
            ..Self::new(IntegrityState::MissingRecord)
        }
    }

    pub fn missing_document(record: &str, expected: Option<DigestValue>) -> Self {
        Self {
            record: Some(record.to_string()),
            expected,
            ..Self::new(IntegrityState::MissingDocument)
        }
    }

    pub fn unreadable_record(document: &str, record: &str, detail: impl Into<String>) -> Self {
        Self {
            document: Some(document.to_string()),
            record: Some(record.to_string()),
            detail: Some(detail.into()),
            ..Self::new(IntegrityState::UnreadableRecord)
        }
    }

    pub fn unreadable_document(
        document: &str,
        record: &str,
        expected: DigestValue,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            document: Some(document.to_string()),
            record: Some(record.to_string()),
            expected: Some(expected),
            detail: Some(detail.into()),
            ..Self::new(IntegrityState::UnreadableDocument)
        }
    }

    /// The name an entry is reported under: its document, or its record for orphans.
    pub fn name(&self) -> &str {
        self.document
            .as_deref()
            .or(self.record.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub entries: Vec<ClassificationEntry>,
}

impl ReconcileReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ClassificationEntry) {
        self.entries.push(entry);
    }

    /// Orders entries by case-insensitive name, independent of arrival order.
    pub fn sort(&mut self) {
        self.entries.sort_by_cached_key(|e| {
            let (folded, exact) = sort_key(e.name());
            (folded, exact, e.state)
        });
    }

    pub fn count(&self, state: IntegrityState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    pub fn summary(&self) -> HashMap<IntegrityState, usize> {
        let mut counts: HashMap<IntegrityState, usize> = HashMap::new();
        for e in &self.entries {
            *counts.entry(e.state).or_default() += 1;
        }
        counts
    }

    pub fn by_state(&self) -> HashMap<IntegrityState, Vec<&ClassificationEntry>> {
        let mut grouped: HashMap<IntegrityState, Vec<&ClassificationEntry>> = HashMap::new();
        for e in &self.entries {
            grouped.entry(e.state).or_default().push(e);
        }
        grouped
    }

    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.state.is_ok())
    }

    pub fn problems(&self) -> Vec<&ClassificationEntry> {
        self.entries.iter().filter(|e| !e.state.is_ok()).collect()
    }

    /// Entries that involve a document, i.e. everything except orphan records.
    pub fn document_entries(&self) -> Vec<&ClassificationEntry> {
        self.entries.iter().filter(|e| e.document.is_some()).collect()
    }

    pub fn orphan_records(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.state == IntegrityState::MissingDocument)
            .filter_map(|e| e.record.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct VerifyTableRow {
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Document")]
    pub document: String,
    #[tabled(rename = "Record")]
    pub record: String,
    #[tabled(rename = "Expected")]
    pub expected: String,
    #[tabled(rename = "Actual")]
    pub actual: String,
}

impl From<&ClassificationEntry> for VerifyTableRow {
    fn from(entry: &ClassificationEntry) -> Self {
        let short = |d: &Option<DigestValue>| match d {
            Some(d) => d.short().to_string(),
            None => "-".to_string(),
        };

        VerifyTableRow {
            status: format!("{} {}", entry.state.symbol(), entry.state.as_str()),
            document: entry.document.clone().unwrap_or_else(|| "-".to_string()),
            record: entry.record.clone().unwrap_or_else(|| "-".to_string()),
            expected: short(&entry.expected),
            actual: short(&entry.actual),
        }
    }
}
