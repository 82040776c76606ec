use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{BATCH_LIMIT, SweepReport};
use crate::domain::{
    entities::listings::BoostPlan,
    repositories::entitlement_store::EntitlementStore,
    value_objects::enums::{boost_names::BoostName, boost_targets::BoostTarget},
};

/// Resets lapsed product or service boosts to `No Plan`.
pub struct ExpireBoostsUseCase<S>
where
    S: EntitlementStore,
{
    store: Arc<S>,
    target: BoostTarget,
}

impl<S> ExpireBoostsUseCase<S>
where
    S: EntitlementStore,
{
    pub fn new(store: Arc<S>, target: BoostTarget) -> Self {
        Self { store, target }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let target = self.target;
        let listing_ids = self.store.list_expired_boosts(target, now, BATCH_LIMIT).await?;
        let mut report = SweepReport::scanned(listing_ids.len());

        for listing_id in listing_ids {
            let result = self
                .store
                .transaction(move |tx| {
                    let Some(listing) = tx.find_listing(target, listing_id)? else {
                        return Ok(false);
                    };
                    let lapsed = listing.boost.name != BoostName::NoPlan
                        && listing.boost.expires_at.is_some_and(|at| at < now);
                    if !lapsed {
                        return Ok(false);
                    }

                    tx.update_boost(target, listing_id, &BoostPlan::none())?;
                    Ok(true)
                })
                .await;
            report.record("expire_boosts", listing_id, result);
        }

        if report.applied > 0 {
            info!(target = %target, expired = report.applied, "expire_boosts: completed");
        }
        Ok(report)
    }
}
