use sha2::digest::Output;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use super::algorithm::{DigestAlgorithm, DigestValue};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

pub fn digest_file(
    path: impl AsRef<Path>,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> io::Result<DigestValue> {
    let file = File::open(path.as_ref())?;
    digest_reader(file, algorithm, chunk_size)
}

pub fn digest_reader<R: Read>(
    reader: R,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> io::Result<DigestValue> {
    let hex = match algorithm {
        DigestAlgorithm::Sha256 => format!("{:x}", fold_chunks::<Sha256, R>(reader, chunk_size)?),
        DigestAlgorithm::Sha512 => format!("{:x}", fold_chunks::<Sha512, R>(reader, chunk_size)?),
    };
    Ok(DigestValue::from_hex(hex))
}

pub fn digest_bytes(bytes: &[u8], algorithm: DigestAlgorithm) -> DigestValue {
    let hex = match algorithm {
        DigestAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
        DigestAlgorithm::Sha512 => format!("{:x}", Sha512::digest(bytes)),
    };
    DigestValue::from_hex(hex)
}

fn fold_chunks<D: Digest, R: Read>(mut reader: R, chunk_size: usize) -> io::Result<Output<D>> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize())
}
