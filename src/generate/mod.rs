//! Generation pass: digest every document and write its sidecar record.

use chrono::{DateTime, Local};
use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info, warn};
use crate::digest::{digest_file, run_bounded, DigestValue};
use crate::error::{DocSealError, Result};
use crate::manifest::ManifestStore;
use crate::naming::NamingRule;
use crate::namespace::{DocumentEntry, Namespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Rewrite every record from the current document content.
    #[default]
    All,
    /// Only seal documents that have no record yet.
    MissingOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Written,
    Skipped,
    Failed(String),
}

impl GenerationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationOutcome::Written => "written",
            GenerationOutcome::Skipped => "skipped",
            GenerationOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedEntry {
    pub document: String,
    pub record: String,
    pub digest: Option<DigestValue>,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub entries: Vec<GeneratedEntry>,
}

impl GenerationReport {
    pub fn written_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome == GenerationOutcome::Written).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome == GenerationOutcome::Skipped).count()
    }

    pub fn failures(&self) -> Vec<&GeneratedEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, GenerationOutcome::Failed(_)))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct GenerateTableRow {
    #[tabled(rename = "Document")]
    pub document: String,
    #[tabled(rename = "Digest")]
    pub digest: String,
    #[tabled(rename = "Record")]
    pub record: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&GeneratedEntry> for GenerateTableRow {
    fn from(entry: &GeneratedEntry) -> Self {
        GenerateTableRow {
            document: entry.document.clone(),
            digest: entry
                .digest
                .as_ref()
                .map(|d| d.short().to_string())
                .unwrap_or_else(|| "-".to_string()),
            record: entry.record.clone(),
            status: entry.outcome.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct SealJob {
    document: DocumentEntry,
    record: String,
    store: ManifestStore,
}

impl SealJob {
    fn run(self, rule: &NamingRule, chunk_size: usize) -> GeneratedEntry {
        let path = self.store.path_for(&self.document.name);
        let (digest, outcome) = match digest_file(&path, rule.algorithm(), chunk_size) {
            Ok(digest) => match self.store.write(&self.record, &digest) {
                Ok(()) => (Some(digest), GenerationOutcome::Written),
                Err(e) => {
                    warn!("Could not write {}: {}", self.record, e);
                    (Some(digest), GenerationOutcome::Failed(format!("write failed: {}", e)))
                }
            },
            Err(e) => {
                warn!("Could not digest {}: {}", self.document.name, e);
                (None, GenerationOutcome::Failed(format!("read failed: {}", e)))
            }
        };

        self.entry(digest, outcome)
    }

    fn entry(self, digest: Option<DigestValue>, outcome: GenerationOutcome) -> GeneratedEntry {
        GeneratedEntry {
            document: self.document.name,
            record: self.record,
            digest,
            size: self.document.size,
            modified: self.document.modified,
            outcome,
        }
    }
}

pub struct Generator {
    rule: NamingRule,
    chunk_size: usize,
}

impl Generator {
    pub fn new(rule: NamingRule, chunk_size: usize) -> Self {
        Self { rule, chunk_size }
    }

    pub fn generate(&self, namespace: &Namespace, mode: GenerationMode) -> Result<GenerationReport> {
        let (jobs, mut entries) = self.plan(namespace, mode);
        for job in jobs {
            entries.push(job.run(&self.rule, self.chunk_size));
        }
        self.finish(namespace, entries)
    }

    pub async fn generate_concurrent(
        &self,
        namespace: &Namespace,
        mode: GenerationMode,
        jobs: usize,
    ) -> Result<GenerationReport> {
        if jobs <= 1 {
            return self.generate(namespace, mode);
        }

        let (pending, mut entries) = self.plan(namespace, mode);
        let rule = self.rule.clone();
        let chunk_size = self.chunk_size;

        let sealed = run_bounded(
            pending,
            jobs,
            move |job: SealJob| job.run(&rule, chunk_size),
            |job, reason| {
                let outcome = GenerationOutcome::Failed(format!("seal task failed: {}", reason));
                job.entry(None, outcome)
            },
        )
        .await;

        entries.extend(sealed);
        self.finish(namespace, entries)
    }

    fn plan(&self, namespace: &Namespace, mode: GenerationMode) -> (Vec<SealJob>, Vec<GeneratedEntry>) {
        let store = ManifestStore::new(namespace.root());
        let mut jobs = Vec::new();
        let mut skipped = Vec::new();

        for document in namespace.documents() {
            let Some(record) = self.rule.record_name_for(&document.name) else {
                continue;
            };

            let job = SealJob {
                document: document.clone(),
                record,
                store: store.clone(),
            };

            if mode == GenerationMode::MissingOnly && namespace.has_record(&job.record) {
                debug!("Keeping existing record {}", job.record);
                let digest = store.read(&job.record).ok();
                skipped.push(job.entry(digest, GenerationOutcome::Skipped));
            } else {
                jobs.push(job);
            }
        }

        (jobs, skipped)
    }

    /// Sorts the entries and checks every record that should exist actually does.
    fn finish(&self, namespace: &Namespace, mut entries: Vec<GeneratedEntry>) -> Result<GenerationReport> {
        entries.sort_by_cached_key(|e| crate::namespace::sort_key(&e.document));

        let store = ManifestStore::new(namespace.root());
        let missing: Vec<String> = entries
            .iter()
            .filter(|e| e.digest.is_some() || e.outcome == GenerationOutcome::Skipped)
            .filter(|e| !store.exists(&e.record))
            .map(|e| e.record.clone())
            .collect();

        if !missing.is_empty() {
            return Err(DocSealError::MissingOutputs(missing));
        }

        let report = GenerationReport { entries };
        info!(
            "Sealed {} documents ({} written, {} skipped, {} failed)",
            report.entries.len(),
            report.written_count(),
            report.skipped_count(),
            report.failures().len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scan(dir: &TempDir) -> Namespace {
        Namespace::scan(dir.path(), &NamingRule::default(), false).unwrap()
    }

    #[test]
    fn test_generate_writes_records() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "X").unwrap();
        fs::write(dir.path().join("B.PDF"), "Y").unwrap();

        let generator = Generator::new(NamingRule::default(), 4);
        let report = generator.generate(&scan(&dir), GenerationMode::All).unwrap();

        assert_eq!(report.written_count(), 2);
        assert!(report.is_success());
        assert!(dir.path().join("a.sha256.txt").exists());
        assert!(dir.path().join("B.sha256.txt").exists());
        assert_eq!(report.entries[0].document, "a.pdf");
    }

    #[test]
    fn test_missing_only_keeps_existing_records() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "X").unwrap();
        fs::write(dir.path().join("a.sha256.txt"), "stale\n").unwrap();
        fs::write(dir.path().join("b.pdf"), "Y").unwrap();

        let generator = Generator::new(NamingRule::default(), 4);
        let report = generator.generate(&scan(&dir), GenerationMode::MissingOnly).unwrap();

        assert_eq!(report.written_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        let kept = fs::read_to_string(dir.path().join("a.sha256.txt")).unwrap();
        assert_eq!(kept, "stale\n");
    }

    #[tokio::test]
    async fn test_concurrent_generation_matches_sequential() {
        let dir = TempDir::new().unwrap();
        for i in 0..12 {
            fs::write(dir.path().join(format!("doc{:02}.pdf", i)), format!("content {}", i)).unwrap();
        }

        let generator = Generator::new(NamingRule::default(), 3);
        let sequential = generator.generate(&scan(&dir), GenerationMode::All).unwrap();
        let concurrent = generator
            .generate_concurrent(&scan(&dir), GenerationMode::All, 4)
            .await
            .unwrap();

        let digests = |r: &GenerationReport| {
            r.entries
                .iter()
                .map(|e| (e.document.clone(), e.digest.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(digests(&sequential), digests(&concurrent));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_generation_with_shared_record_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), vec![1u8; 200 * 1024]).unwrap();
        fs::write(dir.path().join("a.PDF"), vec![2u8; 200 * 1024]).unwrap();
        if fs::read_dir(dir.path()).unwrap().count() < 2 {
            // case-insensitive filesystem
            return;
        }

        let generator = Generator::new(NamingRule::default(), 16 * 1024);
        for _ in 0..50 {
            let report = generator
                .generate_concurrent(&scan(&dir), GenerationMode::All, 4)
                .await
                .unwrap();

            assert_eq!(report.written_count(), 2);
            assert!(report.failures().is_empty());
        }

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
