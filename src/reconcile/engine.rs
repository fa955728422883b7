use std::path::PathBuf;
use tracing::{debug, info, warn};
use crate::digest::{digest_file, run_bounded, DigestAlgorithm, DigestValue};
use crate::manifest::ManifestStore;
use crate::naming::NamingRule;
use crate::namespace::{DocumentEntry, Namespace};
use super::state::{ClassificationEntry, ReconcileReport};

/// Joins documents and sidecar records of one namespace and classifies every item.
pub struct Reconciler {
    rule: NamingRule,
    chunk_size: usize,
}

enum Planned {
    Classified(ClassificationEntry),
    NeedsDigest(DigestJob),
}

#[derive(Debug, Clone)]
struct DigestJob {
    document: String,
    record: String,
    expected: DigestValue,
    path: PathBuf,
}

impl DigestJob {
    fn run(self, algorithm: DigestAlgorithm, chunk_size: usize) -> ClassificationEntry {
        match digest_file(&self.path, algorithm, chunk_size) {
            Ok(actual) if actual.matches(&self.expected) => {
                ClassificationEntry::ok(&self.document, &self.record, actual)
            }
            Ok(actual) => {
                warn!("Digest mismatch for {}", self.document);
                ClassificationEntry::mismatch(&self.document, &self.record, self.expected, actual)
            }
            Err(e) => self.failed(e.to_string()),
        }
    }

    fn failed(self, reason: String) -> ClassificationEntry {
        warn!("Could not digest {}: {}", self.document, reason);
        ClassificationEntry::unreadable_document(&self.document, &self.record, self.expected, reason)
    }
}

impl Reconciler {
    pub fn new(rule: NamingRule, chunk_size: usize) -> Self {
        Self { rule, chunk_size }
    }

    pub fn rule(&self) -> &NamingRule {
        &self.rule
    }

    pub fn reconcile(&self, namespace: &Namespace) -> ReconcileReport {
        let store = ManifestStore::new(namespace.root());
        let mut report = ReconcileReport::new();

        for document in namespace.documents() {
            let entry = match self.plan_document(namespace, &store, document) {
                Planned::Classified(entry) => entry,
                Planned::NeedsDigest(job) => job.run(self.rule.algorithm(), self.chunk_size),
            };
            report.add(entry);
        }

        self.classify_orphans(namespace, &store, &mut report);
        self.finish(report)
    }

    /// Same classification as [`Reconciler::reconcile`], with digesting spread over
    /// up to `jobs` blocking tasks.
    pub async fn reconcile_concurrent(&self, namespace: &Namespace, jobs: usize) -> ReconcileReport {
        if jobs <= 1 {
            return self.reconcile(namespace);
        }

        let store = ManifestStore::new(namespace.root());
        let mut report = ReconcileReport::new();
        let mut pending = Vec::new();

        for document in namespace.documents() {
            match self.plan_document(namespace, &store, document) {
                Planned::Classified(entry) => report.add(entry),
                Planned::NeedsDigest(job) => pending.push(job),
            }
        }

        debug!("Digesting {} documents with {} workers", pending.len(), jobs);

        let algorithm = self.rule.algorithm();
        let chunk_size = self.chunk_size;
        let digested = run_bounded(
            pending,
            jobs,
            move |job: DigestJob| job.run(algorithm, chunk_size),
            |job, reason| job.failed(format!("digest task failed: {}", reason)),
        )
        .await;

        for entry in digested {
            report.add(entry);
        }

        self.classify_orphans(namespace, &store, &mut report);
        self.finish(report)
    }

    fn plan_document(&self, namespace: &Namespace, store: &ManifestStore, document: &DocumentEntry) -> Planned {
        let name = document.name.as_str();
        let primary = self
            .rule
            .record_name_for(name)
            .unwrap_or_else(|| format!("{}{}", name, self.rule.record_suffix()));

        let record = if namespace.has_record(&primary) {
            primary
        } else {
            match self
                .rule
                .alternate_record_names_for(name)
                .into_iter()
                .find(|alt| namespace.has_record(alt))
            {
                Some(alt) => {
                    debug!("Using alternate record {} for {}", alt, name);
                    alt
                }
                None => return Planned::Classified(ClassificationEntry::missing_record(name, &primary)),
            }
        };

        match store.read(&record) {
            Ok(expected) => Planned::NeedsDigest(DigestJob {
                document: name.to_string(),
                record,
                expected,
                path: namespace.path_of(name),
            }),
            Err(e) => {
                warn!("Record {}: {}", record, e);
                Planned::Classified(ClassificationEntry::unreadable_record(name, &record, e.to_string()))
            }
        }
    }

    fn classify_orphans(&self, namespace: &Namespace, store: &ManifestStore, report: &mut ReconcileReport) {
        for record in namespace.records() {
            if namespace.resolve_document(&self.rule, &record.name).is_none() {
                let expected = store.read(&record.name).ok();
                report.add(ClassificationEntry::missing_document(&record.name, expected));
            }
        }
    }

    fn finish(&self, mut report: ReconcileReport) -> ReconcileReport {
        report.sort();
        info!(
            "Reconciled {} entries, {} with problems",
            report.entries.len(),
            report.problems().len()
        );
        report
    }
}
