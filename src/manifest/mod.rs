mod store;

pub use store::{parse_record, ManifestStore, RecordError};
