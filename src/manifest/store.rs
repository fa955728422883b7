use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;
use crate::digest::DigestValue;

/// Why a record yielded no digest. Both cases classify as an unreadable record.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record is empty")]
    Empty,

    #[error("record could not be read: {0}")]
    Io(#[from] io::Error),
}

/// Reads and writes sidecar records relative to one root directory.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, record: &str) -> PathBuf {
        self.root.join(record)
    }

    pub fn exists(&self, record: &str) -> bool {
        self.path_for(record).is_file()
    }

    pub fn read(&self, record: &str) -> Result<DigestValue, RecordError> {
        let bytes = fs::read(self.path_for(record))?;
        parse_record(&String::from_utf8_lossy(&bytes))
    }

    /// Overwrites the record with `digest` and a trailing newline.
    ///
    /// The content goes to a sibling temp file first and is renamed over the
    /// target, so a reader never sees a half-written digest. Every call gets its
    /// own temp file, so concurrent writers of one record never share one.
    pub fn write(&self, record: &str, digest: &DigestValue) -> io::Result<()> {
        let target = self.path_for(record);
        let tmp = tmp_path(&target);

        fs::write(&tmp, format!("{}\n", digest))?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!("Wrote {}", target.display());
        Ok(())
    }
}

/// First whitespace-delimited token of the first line, lower-cased.
pub fn parse_record(content: &str) -> Result<DigestValue, RecordError> {
    content
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .map(DigestValue::from_token)
        .ok_or(RecordError::Empty)
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn tmp_path(target: &Path) -> PathBuf {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}-{}.tmp", std::process::id(), seq));
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_record_first_token() {
        let value = parse_record("ABCDEF  a.pdf\nsecond line\n").unwrap();
        assert_eq!(value.as_str(), "abcdef");
    }

    #[test]
    fn test_parse_record_empty() {
        assert!(matches!(parse_record(""), Err(RecordError::Empty)));
        assert!(matches!(parse_record("   \t\n"), Err(RecordError::Empty)));
        assert!(matches!(parse_record("\nabc\n"), Err(RecordError::Empty)));
    }

    #[test]
    fn test_parse_record_accepts_opaque_tokens() {
        let value = parse_record("not-a-digest\n").unwrap();
        assert_eq!(value.as_str(), "not-a-digest");
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        let digest = DigestValue::from_token("00ff");

        store.write("a.sha256.txt", &digest).unwrap();

        let content = fs::read_to_string(dir.path().join("a.sha256.txt")).unwrap();
        assert_eq!(content, "00ff\n");
        assert_eq!(store.read("a.sha256.txt").unwrap(), digest);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_temp_names_are_unique_per_write() {
        let target = Path::new("/docs/a.sha256.txt");
        let first = tmp_path(target);
        let second = tmp_path(target);

        assert_ne!(first, second);
        assert_eq!(first.parent(), target.parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn test_concurrent_writes_to_one_record_all_succeed() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = &store;
                    s.spawn(move || {
                        for _ in 0..25 {
                            store.write("a.sha256.txt", &DigestValue::from_token(&format!("{:04x}", i)))?;
                        }
                        Ok::<_, io::Error>(())
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }
        });

        assert!(store.read("a.sha256.txt").unwrap().as_str().len() == 4);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_overwrites_in_place() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());

        store.write("a.sha256.txt", &DigestValue::from_token("aaaa")).unwrap();
        store.write("a.sha256.txt", &DigestValue::from_token("bbbb")).unwrap();

        assert_eq!(store.read("a.sha256.txt").unwrap().as_str(), "bbbb");
    }

    #[test]
    fn test_read_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        assert!(matches!(store.read("missing.sha256.txt"), Err(RecordError::Io(_))));
    }
}
