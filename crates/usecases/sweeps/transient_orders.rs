use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::{BATCH_LIMIT, SweepReport};
use crate::domain::repositories::entitlement_store::EntitlementStore;

pub const DEFAULT_TRANSIENT_ORDER_TTL_MINUTES: i64 = 15;

/// Returns stock reserved by checkouts that were never paid.
pub struct RestoreTransientOrdersUseCase<S>
where
    S: EntitlementStore,
{
    store: Arc<S>,
    ttl: Duration,
}

impl<S> RestoreTransientOrdersUseCase<S>
where
    S: EntitlementStore,
{
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let restored = self
            .store
            .restore_abandoned_transient_orders(now - self.ttl, BATCH_LIMIT)
            .await?;

        if restored > 0 {
            info!(restored, "restore_transient_orders: stock returned");
        }

        Ok(SweepReport {
            applied: restored,
            ..SweepReport::scanned(restored)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::entities::markers::{PendingMarker, TransientOrder, TransientOrderItem},
        domain::value_objects::enums::boost_targets::BoostTarget,
        usecases::reconciliation::test_support::Harness,
    };
    use uuid::Uuid;

    fn order(
        buyer_id: Uuid,
        product_id: Uuid,
        seller_id: Uuid,
        pi: &str,
        created_at: DateTime<Utc>,
    ) -> PendingMarker {
        PendingMarker::TransientOrder(TransientOrder {
            id: Uuid::new_v4(),
            buyer_id,
            payment_intent_id: pi.to_string(),
            total_minor: 1000,
            created_at,
            items: vec![TransientOrderItem {
                product_id,
                seller_id,
                price_minor: 500,
                quantity: 2,
            }],
        })
    }

    #[tokio::test]
    async fn restores_stock_of_orders_older_than_ttl() {
        let harness = Harness::new();
        let now = Utc::now();
        let buyer = harness.client(now);
        let seller = harness.client(now);
        let product = harness.product(seller, 500, 3);

        harness
            .store
            .insert_marker(order(buyer, product, seller, "pi_old", now - Duration::minutes(16)));
        harness
            .store
            .insert_marker(order(buyer, product, seller, "pi_fresh", now - Duration::minutes(5)));

        let usecase = RestoreTransientOrdersUseCase::new(
            Arc::clone(&harness.store),
            Duration::minutes(DEFAULT_TRANSIENT_ORDER_TTL_MINUTES),
        );
        let report = usecase.run(now).await.unwrap();

        assert_eq!(report.applied, 1);
        let state = harness.store.snapshot();
        assert_eq!(
            state.listing(BoostTarget::Product, product).unwrap().quantity,
            Some(5)
        );
        assert!(!state.markers.contains_key("pi_old"));
        assert!(state.markers.contains_key("pi_fresh"));
    }
}
