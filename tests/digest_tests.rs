use docseal::{digest_bytes, digest_file, DigestAlgorithm, ManifestStore, NamingRule, RecordError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_digest_file_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.pdf");
    fs::write(&path, b"%PDF-1.7 some content").unwrap();

    let first = digest_file(&path, DigestAlgorithm::Sha256, 4).unwrap();
    let second = digest_file(&path, DigestAlgorithm::Sha256, 1024).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, digest_bytes(b"%PDF-1.7 some content", DigestAlgorithm::Sha256));
}

#[test]
fn test_identical_content_under_different_names() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("one.pdf"), b"same bytes").unwrap();
    fs::write(dir.path().join("two.PDF"), b"same bytes").unwrap();

    let one = digest_file(dir.path().join("one.pdf"), DigestAlgorithm::Sha256, 3).unwrap();
    let two = digest_file(dir.path().join("two.PDF"), DigestAlgorithm::Sha256, 3).unwrap();
    assert_eq!(one, two);
}

#[test]
fn test_flipped_byte_changes_file_digest() {
    let dir = TempDir::new().unwrap();
    let mut content = vec![7u8; 4096];
    fs::write(dir.path().join("a.pdf"), &content).unwrap();
    content[2048] ^= 0x01;
    fs::write(dir.path().join("b.pdf"), &content).unwrap();

    let a = digest_file(dir.path().join("a.pdf"), DigestAlgorithm::Sha256, 512).unwrap();
    let b = digest_file(dir.path().join("b.pdf"), DigestAlgorithm::Sha256, 512).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_large_file_streams_in_chunks() {
    let dir = TempDir::new().unwrap();
    let content: Vec<u8> = (0..3 * 1024 * 1024 + 17).map(|i: u32| (i % 253) as u8).collect();
    fs::write(dir.path().join("big.pdf"), &content).unwrap();

    let streamed = digest_file(dir.path().join("big.pdf"), DigestAlgorithm::Sha256, 64 * 1024).unwrap();
    assert_eq!(streamed, digest_bytes(&content, DigestAlgorithm::Sha256));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = digest_file(dir.path().join("nope.pdf"), DigestAlgorithm::Sha256, 16).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_write_read_round_trip_through_naming_rule() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Report 2024.PDF"), b"quarterly").unwrap();

    let rule = NamingRule::default();
    let store = ManifestStore::new(dir.path());
    let digest = digest_file(dir.path().join("Report 2024.PDF"), rule.algorithm(), 8).unwrap();
    let record = rule.record_name_for("Report 2024.PDF").unwrap();

    store.write(&record, &digest).unwrap();

    assert_eq!(record, "Report 2024.sha256.txt");
    assert!(store.read(&record).unwrap().matches(&digest));
    assert_eq!(
        rule.document_name_for(&record, |name| name == "Report 2024.PDF").as_deref(),
        Some("Report 2024.PDF")
    );
}

#[test]
fn test_sha512_round_trip() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.pdf"), b"X").unwrap();

    let rule = NamingRule::new(["pdf"], DigestAlgorithm::Sha512);
    let store = ManifestStore::new(dir.path());
    let digest = digest_file(dir.path().join("a.pdf"), rule.algorithm(), 8).unwrap();
    let record = rule.record_name_for("a.pdf").unwrap();
    store.write(&record, &digest).unwrap();

    assert_eq!(record, "a.sha512.txt");
    assert_eq!(store.read(&record).unwrap().as_str().len(), 128);
}

#[test]
fn test_zero_length_record_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("b.sha256.txt"), b"").unwrap();

    let store = ManifestStore::new(dir.path());
    assert!(matches!(store.read("b.sha256.txt"), Err(RecordError::Empty)));
}
