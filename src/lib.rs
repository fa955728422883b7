pub mod error;
pub mod config;
pub mod digest;
pub mod naming;
pub mod manifest;
pub mod namespace;
pub mod reconcile;
pub mod generate;
pub mod report;
pub mod cleanup;

pub use error::{DocSealError, Result};
pub use config::{ConfigOverrides, SealConfig};
pub use digest::{digest_bytes, digest_file, digest_reader, DigestAlgorithm, DigestValue, DEFAULT_CHUNK_SIZE};
pub use naming::NamingRule;
pub use manifest::{ManifestStore, RecordError};
pub use namespace::{DocumentEntry, Namespace, RecordEntry};
pub use reconcile::{ClassificationEntry, IntegrityState, ReconcileReport, Reconciler, VerifyTableRow};
pub use generate::{GeneratedEntry, GenerationMode, GenerationOutcome, GenerationReport, Generator, GenerateTableRow};
pub use report::{render_generation_markdown, render_listing_markdown, render_verify_markdown, write_report, ReportNaming};
pub use cleanup::{AutoConfirm, CleanupOutcome, CleanupPlan, Confirm};
