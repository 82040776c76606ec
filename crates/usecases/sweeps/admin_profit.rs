use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use super::{BATCH_LIMIT, SweepReport};
use crate::domain::repositories::{
    entitlement_store::EntitlementStore, payment_gateways::StripeGateway,
};

/// Turns admin profit accruals into realized profit once Stripe reports the fee.
pub struct AdminProfitUseCase<S, G>
where
    S: EntitlementStore,
    G: StripeGateway + ?Sized,
{
    store: Arc<S>,
    stripe: Arc<G>,
}

impl<S, G> AdminProfitUseCase<S, G>
where
    S: EntitlementStore,
    G: StripeGateway + ?Sized,
{
    pub fn new(store: Arc<S>, stripe: Arc<G>) -> Self {
        Self { store, stripe }
    }

    pub async fn run(&self) -> Result<SweepReport> {
        let accruals = self.store.list_admin_profit_accruals(BATCH_LIMIT).await?;
        let mut report = SweepReport::scanned(accruals.len());

        for accrual in accruals {
            let payment_intent_id = accrual.payment_intent_id.clone();

            // Network call stays outside the transaction.
            let settlement = match self.stripe.fetch_settlement(&payment_intent_id).await {
                Ok(settlement) => settlement,
                Err(err) => {
                    error!(
                        payment_intent_id = %payment_intent_id,
                        error = ?err,
                        "admin_profit: failed to fetch settlement; retried next tick"
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let key = payment_intent_id.clone();
            let result = self
                .store
                .transaction(move |tx| {
                    let Some(accrual) = tx.find_admin_profit_accrual(&key)? else {
                        return Ok(None);
                    };
                    let profit_minor = settlement.amount_minor
                        - settlement.fee_minor
                        - accrual.transfer_amount_minor;

                    tx.add_admin_profit(profit_minor)?;
                    tx.delete_admin_profit_accrual(&key)?;
                    Ok(Some(profit_minor))
                })
                .await;

            match result {
                Ok(Some(profit_minor)) => {
                    if profit_minor < 0 {
                        warn!(
                            payment_intent_id = %payment_intent_id,
                            profit_minor,
                            "admin_profit: negative profit realized"
                        );
                    }
                    report.applied += 1;
                }
                Ok(None) => report.skipped += 1,
                Err(err) => {
                    error!(
                        payment_intent_id = %payment_intent_id,
                        error = %err,
                        "admin_profit: failed to realize accrual"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.applied > 0 {
            info!(realized = report.applied, "admin_profit: completed");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::ledger::AdminProfitAccrual,
            repositories::payment_gateways::{MockStripeGateway, Settlement},
        },
        infra::db::memory::MemoryEntitlementStore,
    };
    use anyhow::anyhow;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn accrual(payment_intent_id: &str, transfer_amount_minor: i64) -> AdminProfitAccrual {
        AdminProfitAccrual {
            payment_intent_id: payment_intent_id.to_string(),
            transfer_amount_minor,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn realizes_profit_net_of_fee_and_transfers() {
        let store = Arc::new(MemoryEntitlementStore::new());
        store.insert_admin_profit_accrual(accrual("pi_order", 4500));

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_fetch_settlement()
            .with(eq("pi_order"))
            .times(1)
            .returning(|_| {
                Ok(Settlement {
                    amount_minor: 5000,
                    fee_minor: 175,
                })
            });

        let report = AdminProfitUseCase::new(Arc::clone(&store), Arc::new(stripe))
            .run()
            .await
            .unwrap();

        assert_eq!(report.applied, 1);
        let state = store.snapshot();
        assert_eq!(state.admin_profit_minor, 325);
        assert!(state.admin_profit_accruals.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_keeps_accrual_for_next_tick() {
        let store = Arc::new(MemoryEntitlementStore::new());
        store.insert_admin_profit_accrual(accrual("pi_boost", 0));

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_fetch_settlement()
            .returning(|_| Err(anyhow!("stripe unavailable")));

        let report = AdminProfitUseCase::new(Arc::clone(&store), Arc::new(stripe))
            .run()
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        let state = store.snapshot();
        assert_eq!(state.admin_profit_minor, 0);
        assert!(state.admin_profit_accruals.contains_key("pi_boost"));
    }

    #[tokio::test]
    async fn negative_profit_is_still_recorded() {
        let store = Arc::new(MemoryEntitlementStore::new());
        store.insert_admin_profit_accrual(accrual("pi_thin", 900));

        let mut stripe = MockStripeGateway::new();
        stripe.expect_fetch_settlement().returning(|_| {
            Ok(Settlement {
                amount_minor: 1000,
                fee_minor: 130,
            })
        });

        AdminProfitUseCase::new(Arc::clone(&store), Arc::new(stripe))
            .run()
            .await
            .unwrap();

        assert_eq!(store.snapshot().admin_profit_minor, -30);
    }
}
