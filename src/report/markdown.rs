use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::info;
use crate::error::{DocSealError, Result};
use crate::generate::GenerationReport;
use crate::namespace::DocumentEntry;
use crate::reconcile::{IntegrityState, ReconcileReport};

pub const HUMAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Tabled)]
struct CheckRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Document")]
    document: String,
    #[tabled(rename = "Record")]
    record: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Actual")]
    actual: String,
}

#[derive(Debug, Clone, Tabled)]
struct MissingRecordRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Document")]
    document: String,
    #[tabled(rename = "Expected record")]
    record: String,
}

#[derive(Debug, Clone, Tabled)]
struct SealedRow {
    #[tabled(rename = "Document")]
    document: String,
    #[tabled(rename = "Digest")]
    digest: String,
    #[tabled(rename = "Record")]
    record: String,
    #[tabled(rename = "Size (bytes)")]
    size: u64,
    #[tabled(rename = "Modified")]
    modified: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct ListingTableRow {
    #[tabled(rename = "Document")]
    pub document: String,
    #[tabled(rename = "Size (bytes)")]
    pub size: u64,
    #[tabled(rename = "Created")]
    pub created: String,
    #[tabled(rename = "Modified")]
    pub modified: String,
}

impl From<&DocumentEntry> for ListingTableRow {
    fn from(doc: &DocumentEntry) -> Self {
        ListingTableRow {
            document: code(&doc.name),
            size: doc.size,
            created: fmt_time(doc.created),
            modified: fmt_time(doc.modified),
        }
    }
}

fn code(s: &str) -> String {
    format!("`{}`", s.replace('`', "'"))
}

fn code_or_dash(s: Option<&str>) -> String {
    s.map(code).unwrap_or_else(|| "—".to_string())
}

fn fmt_time(ts: Option<DateTime<Local>>) -> String {
    ts.map(|t| t.format(HUMAN_TIME_FORMAT).to_string())
        .unwrap_or_else(|| "—".to_string())
}

fn markdown_table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    table.to_string()
}

fn header(out: &mut String, title: &str, folder: &Path, now: DateTime<Local>) {
    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(out, "**Run at:** {}  ", now.format(HUMAN_TIME_FORMAT));
    let _ = writeln!(out, "**Folder:** `{}`\n", folder.display());
}

pub fn render_verify_markdown(
    report: &ReconcileReport,
    folder: &Path,
    tag: &str,
    now: DateTime<Local>,
) -> String {
    let mut out = String::new();
    header(&mut out, &format!("Verify {} Report", tag.to_ascii_uppercase()), folder, now);

    let checks: Vec<CheckRow> = report
        .entries
        .iter()
        .filter(|e| e.state != IntegrityState::MissingRecord)
        .map(|e| CheckRow {
            status: e.state.as_str().to_string(),
            document: code_or_dash(e.document.as_deref()),
            record: code_or_dash(e.record.as_deref()),
            expected: code_or_dash(e.expected.as_ref().map(|d| d.as_str())),
            actual: code_or_dash(e.actual.as_ref().map(|d| d.as_str())),
        })
        .collect();

    let _ = writeln!(out, "## Checks (record → document)\n");
    if checks.is_empty() {
        let _ = writeln!(out, "_No records found._\n");
    } else {
        let _ = writeln!(out, "{}\n", markdown_table(checks));
    }

    let missing: Vec<MissingRecordRow> = report
        .entries
        .iter()
        .filter(|e| e.state == IntegrityState::MissingRecord)
        .map(|e| MissingRecordRow {
            status: e.state.as_str().to_string(),
            document: code_or_dash(e.document.as_deref()),
            record: code_or_dash(e.record.as_deref()),
        })
        .collect();

    let _ = writeln!(out, "## Documents without record\n");
    if missing.is_empty() {
        let _ = writeln!(out, "_Every document has a record._\n");
    } else {
        let _ = writeln!(out, "{}\n", markdown_table(missing));
    }

    let problems_with_detail: Vec<_> = report.entries.iter().filter(|e| e.detail.is_some()).collect();
    if !problems_with_detail.is_empty() {
        let _ = writeln!(out, "## Details\n");
        for e in problems_with_detail {
            let _ = writeln!(
                out,
                "- {} {}: {}",
                e.state.as_str(),
                code(e.name()),
                e.detail.as_deref().unwrap_or_default()
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "## Summary\n");
    for state in IntegrityState::ALL {
        let _ = writeln!(out, "- {}: **{}**", state.as_str(), report.count(state));
    }

    out
}

pub fn render_generation_markdown(
    report: &GenerationReport,
    folder: &Path,
    tag: &str,
    now: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let tag_upper = tag.to_ascii_uppercase();
    let _ = writeln!(out, "# {} Checksums\n", tag_upper);
    let _ = writeln!(out, "Generated: **{}**  ", now.format(HUMAN_TIME_FORMAT));
    let _ = writeln!(out, "Folder: `{}`\n", folder.display());
    let _ = writeln!(
        out,
        "This file was generated automatically. It lists every sealed document in this folder \
         together with its {} checksum and the sidecar record holding it.\n",
        tag_upper
    );

    let rows: Vec<SealedRow> = report
        .entries
        .iter()
        .filter_map(|e| {
            let digest = e.digest.as_ref()?;
            Some(SealedRow {
                document: code(&e.document),
                digest: code(digest.as_str()),
                record: code(&e.record),
                size: e.size,
                modified: fmt_time(e.modified),
            })
        })
        .collect();

    let _ = writeln!(out, "## Files\n");
    if rows.is_empty() {
        let _ = writeln!(out, "_No documents found in this folder._\n");
    } else {
        let _ = writeln!(out, "{}\n", markdown_table(rows));
    }

    let _ = writeln!(out, "## Verification\n");
    let _ = writeln!(out, "Verify in the same folder:\n");
    let _ = writeln!(out, "```sh\ndocseal verify\n```");

    out
}

pub fn render_listing_markdown(
    documents: &[DocumentEntry],
    folder: &Path,
    label: &str,
    now: DateTime<Local>,
) -> String {
    let mut out = String::new();
    header(&mut out, &format!("{} Report", label.to_ascii_uppercase()), folder, now);

    let _ = writeln!(out, "## Files\n");
    if documents.is_empty() {
        let _ = writeln!(out, "_No documents found._");
    } else {
        let rows: Vec<ListingTableRow> = documents.iter().map(ListingTableRow::from).collect();
        let _ = writeln!(out, "{}", markdown_table(rows));
    }

    out
}

pub fn write_report(root: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = root.join(name);
    fs::write(&path, content)
        .map_err(|e| DocSealError::ReportWrite(format!("{}: {}", path.display(), e)))?;
    info!("Wrote {}", name);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::digest::DigestValue;
    use crate::generate::{GeneratedEntry, GenerationOutcome};
    use crate::reconcile::ClassificationEntry;
    use tempfile::TempDir;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 10, 30, 5).unwrap()
    }

    #[test]
    fn test_verify_markdown_sections() {
        let mut report = ReconcileReport::new();
        report.add(ClassificationEntry::ok("a.pdf", "a.sha256.txt", DigestValue::from_token("aa")));
        report.add(ClassificationEntry::missing_record("b.pdf", "b.sha256.txt"));
        report.add(ClassificationEntry::unreadable_record("c.pdf", "c.sha256.txt", "record is empty"));

        let md = render_verify_markdown(&report, Path::new("/docs"), "sha256", now());

        assert!(md.starts_with("# Verify SHA256 Report"));
        assert!(md.contains("**Run at:** 2024-06-15 10:30:05"));
        assert!(md.contains("| OK"));
        assert!(md.contains("`b.sha256.txt`"));
        assert!(md.contains("- UNREADABLE_RECORD `c.pdf`: record is empty"));
        assert!(md.contains("- MISMATCH: **0**"));
        assert!(md.contains("- MISSING_RECORD: **1**"));
    }

    #[test]
    fn test_generation_markdown_sections() {
        let sealed = |document: &str, record: &str, digest: Option<&str>, outcome| GeneratedEntry {
            document: document.to_string(),
            record: record.to_string(),
            digest: digest.map(DigestValue::from_token),
            size: 7,
            modified: Some(now()),
            outcome,
        };
        let report = GenerationReport {
            entries: vec![
                sealed("a.pdf", "a.sha256.txt", Some("abcd"), GenerationOutcome::Written),
                sealed("b.PDF", "b.sha256.txt", None, GenerationOutcome::Failed("denied".to_string())),
            ],
        };

        let md = render_generation_markdown(&report, Path::new("/docs"), "sha256", now());

        assert!(md.starts_with("# SHA256 Checksums"));
        assert!(md.contains("Generated: **2024-06-15 10:30:05**"));
        assert!(md.contains("Folder: `/docs`"));
        assert!(md.contains("## Files"));
        assert!(md.contains("| `a.pdf`"));
        assert!(md.contains("`abcd`"));
        assert!(md.contains("`a.sha256.txt`"));
        assert!(!md.contains("b.PDF"));
        assert!(md.contains("## Verification"));
        assert!(md.contains("docseal verify"));
    }

    #[test]
    fn test_generation_markdown_empty() {
        let md = render_generation_markdown(&GenerationReport::default(), Path::new("/docs"), "sha512", now());
        assert!(md.starts_with("# SHA512 Checksums"));
        assert!(md.contains("_No documents found in this folder._"));
    }

    #[test]
    fn test_listing_markdown_unknown_created() {
        let doc = DocumentEntry::new("a.pdf", 42);
        let md = render_listing_markdown(&[doc], Path::new("/docs"), "pdf", now());
        assert!(md.starts_with("# PDF Report"));
        assert!(md.contains("`a.pdf`"));
        assert!(md.contains("42"));
        assert!(md.contains("—"));
    }

    #[test]
    fn test_listing_markdown_empty() {
        let md = render_listing_markdown(&[], Path::new("/docs"), "pdf", now());
        assert!(md.contains("_No documents found._"));
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = write_report(dir.path(), "VERIFY_SHA256_x.md", "# hi\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "# hi\n");

        let err = write_report(&dir.path().join("missing"), "x.md", "").unwrap_err();
        assert!(matches!(err, DocSealError::ReportWrite(_)));
    }
}
