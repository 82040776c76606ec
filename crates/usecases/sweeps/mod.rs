//! Periodic sweeps over entitlements. Each tick handles at most [`BATCH_LIMIT`] records
//! and re-checks every record inside its own transaction.

pub mod admin_profit;
pub mod boost_expiry;
pub mod broadcasts;
pub mod expiry_warnings;
pub mod free_plans;
pub mod transient_orders;

use tracing::error;
use uuid::Uuid;

use crate::domain::repositories::entitlement_store::TxResult;

pub const BATCH_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn scanned(scanned: usize) -> Self {
        Self {
            scanned,
            ..Default::default()
        }
    }

    /// Tallies one per-record transaction. `Ok(false)` means the record no longer
    /// qualified when re-read.
    fn record(&mut self, job: &'static str, id: Uuid, result: TxResult<bool>) {
        match result {
            Ok(true) => self.applied += 1,
            Ok(false) => self.skipped += 1,
            Err(err) => {
                error!(job, id = %id, error = %err, "sweep: record failed; retried next tick");
                self.failed += 1;
            }
        }
    }
}
