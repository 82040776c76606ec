pub mod worker;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use crates::{
    domain::{
        repositories::{entitlement_store::EntitlementStore, payment_gateways::StripeGateway},
        value_objects::enums::boost_targets::BoostTarget,
    },
    notifications::outbox::NotificationOutbox,
    usecases::sweeps::{
        admin_profit::AdminProfitUseCase, boost_expiry::ExpireBoostsUseCase,
        broadcasts::ScheduledBroadcastsUseCase, expiry_warnings::ExpiryWarningsUseCase,
        free_plans::RenewFreePlansUseCase, transient_orders::RestoreTransientOrdersUseCase,
    },
};
use tokio::task::JoinSet;

use crate::config::config_model::SweepSchedule;
use self::worker::run_every;

/// Every sweep job, wired to one store.
pub struct Sweeps<S, G>
where
    S: EntitlementStore,
    G: StripeGateway + ?Sized,
{
    pub transient_orders: RestoreTransientOrdersUseCase<S>,
    pub free_plans: RenewFreePlansUseCase<S>,
    pub product_boosts: ExpireBoostsUseCase<S>,
    pub service_boosts: ExpireBoostsUseCase<S>,
    pub expiry_warnings: ExpiryWarningsUseCase<S>,
    pub broadcasts: ScheduledBroadcastsUseCase<S>,
    pub admin_profit: AdminProfitUseCase<S, G>,
}

impl<S, G> Sweeps<S, G>
where
    S: EntitlementStore,
    G: StripeGateway + ?Sized + 'static,
{
    pub fn new(
        store: Arc<S>,
        stripe: Arc<G>,
        outbox: NotificationOutbox,
        schedule: &SweepSchedule,
    ) -> Self {
        Self {
            transient_orders: RestoreTransientOrdersUseCase::new(
                Arc::clone(&store),
                schedule.transient_order_ttl,
            ),
            free_plans: RenewFreePlansUseCase::new(Arc::clone(&store)),
            product_boosts: ExpireBoostsUseCase::new(Arc::clone(&store), BoostTarget::Product),
            service_boosts: ExpireBoostsUseCase::new(Arc::clone(&store), BoostTarget::Service),
            expiry_warnings: ExpiryWarningsUseCase::new(Arc::clone(&store), outbox.clone()),
            broadcasts: ScheduledBroadcastsUseCase::new(Arc::clone(&store), outbox),
            admin_profit: AdminProfitUseCase::new(store, stripe),
        }
    }

    /// Spawns one loop per job. The loops only end if their task is aborted.
    pub fn spawn(self: Arc<Self>, schedule: &SweepSchedule, tasks: &mut JoinSet<Result<()>>) {
        let sweeps = Arc::clone(&self);
        tasks.spawn(run_every("transient_orders", schedule.tick, move || {
            let sweeps = Arc::clone(&sweeps);
            async move { sweeps.transient_orders.run(Utc::now()).await }
        }));

        let sweeps = Arc::clone(&self);
        tasks.spawn(run_every("free_plans", schedule.tick, move || {
            let sweeps = Arc::clone(&sweeps);
            async move { sweeps.free_plans.run(Utc::now()).await }
        }));

        let sweeps = Arc::clone(&self);
        tasks.spawn(run_every("product_boost_expiry", schedule.tick, move || {
            let sweeps = Arc::clone(&sweeps);
            async move { sweeps.product_boosts.run(Utc::now()).await }
        }));

        let sweeps = Arc::clone(&self);
        tasks.spawn(run_every("service_boost_expiry", schedule.tick, move || {
            let sweeps = Arc::clone(&sweeps);
            async move { sweeps.service_boosts.run(Utc::now()).await }
        }));

        let sweeps = Arc::clone(&self);
        tasks.spawn(run_every(
            "expiry_warnings",
            schedule.expiry_warnings,
            move || {
                let sweeps = Arc::clone(&sweeps);
                async move { sweeps.expiry_warnings.run(Utc::now()).await }
            },
        ));

        let sweeps = Arc::clone(&self);
        tasks.spawn(run_every("broadcasts", schedule.broadcasts, move || {
            let sweeps = Arc::clone(&sweeps);
            async move { sweeps.broadcasts.run(Utc::now()).await }
        }));

        let sweeps = self;
        tasks.spawn(run_every("admin_profit", schedule.admin_profit, move || {
            let sweeps = Arc::clone(&sweeps);
            async move { sweeps.admin_profit.run().await }
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;
    use crates::{
        domain::{
            entities::users::{SubscriptionPlan, UserEntitlement},
            repositories::payment_gateways::MockStripeGateway,
            value_objects::enums::{plan_names::PlanName, user_roles::UserRole},
        },
        infra::db::memory::MemoryEntitlementStore,
    };
    use uuid::Uuid;

    use super::*;

    fn schedule() -> SweepSchedule {
        SweepSchedule {
            tick: Duration::from_millis(5),
            expiry_warnings: Duration::from_millis(5),
            broadcasts: Duration::from_millis(5),
            admin_profit: Duration::from_millis(5),
            transient_order_ttl: ChronoDuration::minutes(15),
        }
    }

    #[tokio::test]
    async fn spawned_jobs_renew_lapsed_free_plans() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let user_id = Uuid::new_v4();
        let last_month = Utc::now() - ChronoDuration::days(40);
        store.insert_user(UserEntitlement {
            id: user_id,
            role: UserRole::Client,
            wallet_balance_minor: 0,
            device_tokens: Vec::new(),
            stripe_customer_id: None,
            stripe_default_payment_method: None,
            subscription: SubscriptionPlan::free(last_month),
        });

        let (outbox, _messages) = NotificationOutbox::new(8);
        let mut stripe = MockStripeGateway::new();
        stripe.expect_fetch_settlement().never();
        let schedule = schedule();
        let sweeps = Arc::new(Sweeps::new(
            Arc::clone(&store),
            Arc::new(stripe),
            outbox,
            &schedule,
        ));

        let mut tasks = JoinSet::new();
        sweeps.spawn(&schedule, &mut tasks);
        assert_eq!(tasks.len(), 7);

        tokio::time::sleep(Duration::from_millis(100)).await;
        tasks.abort_all();

        let state = store.snapshot();
        let subscription = &state.user(user_id).unwrap().subscription;
        assert_eq!(subscription.name, PlanName::FreePlan);
        assert!(subscription.expires_at.unwrap() > Utc::now());
    }
}
