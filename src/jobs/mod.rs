pub mod reconcile;

pub use reconcile::{run_reconciliation, ReconcileReport};
