mod algorithm;
mod engine;
mod pool;

pub use algorithm::{DigestAlgorithm, DigestValue};
pub use engine::{digest_bytes, digest_file, digest_reader, DEFAULT_CHUNK_SIZE};
pub use pool::run_bounded;
