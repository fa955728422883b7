//! Removal of generated artifacts: sidecar records and Markdown reports.
//!
//! Nothing is deleted without a yes from the injected [`Confirm`].

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::error::Result;
use crate::naming::NamingRule;
use crate::namespace::{sort_key, Namespace};
use crate::report::ReportNaming;

pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Answers every prompt the same way.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    NothingToDelete,
    Aborted,
    Deleted {
        deleted: usize,
        failed: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone)]
pub struct CleanupPlan {
    root: PathBuf,
    records: Vec<String>,
    reports: Vec<String>,
}

impl CleanupPlan {
    /// Collects records from the namespace and report files directly in the root.
    pub fn build(namespace: &Namespace, rule: &NamingRule) -> Result<Self> {
        let naming = ReportNaming::new(rule);
        let records = namespace.records().iter().map(|r| r.name.clone()).collect();

        let mut reports = Vec::new();
        for entry in fs::read_dir(namespace.root())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if naming.is_report(name) {
                    reports.push(name.to_string());
                }
            }
        }
        reports.sort_by_cached_key(|n| sort_key(n));

        Ok(Self {
            root: namespace.root().to_path_buf(),
            records,
            reports,
        })
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }

    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    pub fn targets(&self) -> Vec<&str> {
        self.records
            .iter()
            .chain(self.reports.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.reports.is_empty()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn execute(&self, confirm: &mut dyn Confirm) -> Result<CleanupOutcome> {
        if self.is_empty() {
            return Ok(CleanupOutcome::NothingToDelete);
        }

        let prompt = format!("Delete these {} file(s)? [y/N] ", self.records.len() + self.reports.len());
        if !confirm.confirm(&prompt)? {
            info!("Cleanup aborted");
            return Ok(CleanupOutcome::Aborted);
        }

        let mut deleted = 0;
        let mut failed = Vec::new();
        for name in self.targets() {
            match fs::remove_file(self.root.join(name)) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!("Could not delete {}: {}", name, e);
                    failed.push((name.to_string(), e.to_string()));
                }
            }
        }

        info!("Deleted {} file(s)", deleted);
        Ok(CleanupOutcome::Deleted { deleted, failed })
    }
}
