mod engine;
mod state;

pub use engine::Reconciler;
pub use state::{ClassificationEntry, IntegrityState, ReconcileReport, VerifyTableRow};
