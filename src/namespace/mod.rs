mod entry;
mod scan;

pub use entry::{DocumentEntry, RecordEntry, sort_key};
pub use scan::Namespace;
