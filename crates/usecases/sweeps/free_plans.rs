use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{BATCH_LIMIT, SweepReport};
use crate::domain::{
    entities::users::SubscriptionPlan, repositories::entitlement_store::EntitlementStore,
};

/// Grants lapsed Free Plan users a fresh month of Free Plan benefits.
pub struct RenewFreePlansUseCase<S>
where
    S: EntitlementStore,
{
    store: Arc<S>,
}

impl<S> RenewFreePlansUseCase<S>
where
    S: EntitlementStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let user_ids = self
            .store
            .list_expired_free_plan_users(now, BATCH_LIMIT)
            .await?;
        let mut report = SweepReport::scanned(user_ids.len());

        for user_id in user_ids {
            let result = self
                .store
                .transaction(move |tx| {
                    let Some(user) = tx.find_user(user_id)? else {
                        return Ok(false);
                    };
                    let lapsed = user.subscription.is_free()
                        && user.subscription.expires_at.is_some_and(|at| at < now);
                    if !lapsed {
                        return Ok(false);
                    }

                    tx.update_subscription(user_id, &SubscriptionPlan::free(now))?;
                    Ok(true)
                })
                .await;
            report.record("renew_free_plans", user_id, result);
        }

        if report.applied > 0 {
            info!(renewed = report.applied, "renew_free_plans: completed");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{entities::users::one_month_after, value_objects::enums::plan_names::PlanName},
        usecases::reconciliation::test_support::Harness,
    };
    use chrono::Duration;

    #[tokio::test]
    async fn renews_only_lapsed_free_plans() {
        let harness = Harness::new();
        let now = Utc::now();
        let lapsed = harness.client(now - Duration::days(40));
        let current = harness.client(now - Duration::days(3));

        let report = RenewFreePlansUseCase::new(Arc::clone(&harness.store))
            .run(now)
            .await
            .unwrap();

        assert_eq!(report.scanned, 1);
        assert_eq!(report.applied, 1);

        let state = harness.store.snapshot();
        let renewed = &state.user(lapsed).unwrap().subscription;
        assert_eq!(renewed.name, PlanName::FreePlan);
        assert_eq!(renewed.available_postings, 1);
        assert_eq!(renewed.expires_at, Some(one_month_after(now)));
        assert_eq!(
            state.user(current).unwrap().subscription.expires_at,
            Some(one_month_after(now - Duration::days(3)))
        );
    }
}
