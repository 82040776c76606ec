pub mod reconciliation;
pub mod sweeps;
