use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::Metadata;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    /// Path relative to the scan root, `/`-separated.
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    pub created: Option<DateTime<Local>>,
}

impl DocumentEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: None,
            created: None,
        }
    }

    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            created: metadata.created().ok().map(DateTime::<Local>::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEntry {
    pub name: String,
    pub alternate: bool,
}

impl RecordEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alternate: false,
        }
    }

    pub fn alternate(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alternate: true,
        }
    }
}

/// Case-insensitive ordering key with the exact name as tie-break.
pub fn sort_key(name: &str) -> (String, String) {
    (name.to_lowercase(), name.to_string())
}
