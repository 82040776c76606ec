use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{delete, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use super::entitlement_tx::PgEntitlementTx;
use crate::{
    domain::{
        entities::{
            ledger::AdminProfitAccrual, markers::TransientOrderItemRow,
            notifications::AdminNotification,
        },
        repositories::entitlement_store::{
            EntitlementStore, EntitlementTx, ExpiryCandidate, Recipient, TxResult,
        },
        value_objects::enums::{
            boost_names::BoostName, boost_targets::BoostTarget,
            notification_kinds::NotificationKind, plan_names::PlanName,
            subscription_statuses::SubscriptionStatus, user_roles::UserRole,
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{
            admin_notifications, admin_profit_accruals, products, services,
            transient_order_items, transient_orders, users,
        },
    },
};

type ExpiryRow = (Uuid, Uuid, String, String, Option<DateTime<Utc>>, Vec<String>);

fn into_candidates(rows: Vec<ExpiryRow>) -> Vec<ExpiryCandidate> {
    rows.into_iter()
        .filter_map(|(id, owner_id, title, plan_name, expires_at, device_tokens)| {
            Some(ExpiryCandidate {
                id,
                owner_id,
                title,
                plan_name,
                expires_at: expires_at?,
                device_tokens,
            })
        })
        .collect()
}

pub struct PgEntitlementStore {
    db_pool: Arc<PgPoolSquad>,
}

impl PgEntitlementStore {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EntitlementStore for PgEntitlementStore {
    async fn transaction<R, F>(&self, work: F) -> TxResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn EntitlementTx) -> TxResult<R> + Send + 'static,
    {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> TxResult<R> {
            let mut conn = db_pool
                .get()
                .context("failed to acquire postgres connection")?;

            conn.build_transaction()
                .repeatable_read()
                .run::<R, _, _>(|conn| {
                    let mut tx = PgEntitlementTx::new(conn);
                    work(&mut tx)
                })
        })
        .await
        .context("entitlement transaction task failed")?
    }

    async fn list_expired_free_plan_users(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<Uuid>> {
            let mut conn = db_pool.get()?;

            let result = users::table
                .filter(users::subscription_name.eq(PlanName::FreePlan.as_str()))
                .filter(users::subscription_expires_at.lt(now))
                .select(users::id)
                .limit(limit)
                .load::<Uuid>(&mut conn)?;

            Ok(result)
        })
        .await??)
    }

    async fn list_expired_boosts(
        &self,
        target: BoostTarget,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<Uuid>> {
            let mut conn = db_pool.get()?;

            let result = match target {
                BoostTarget::Product => products::table
                    .filter(products::boost_name.ne(BoostName::NoPlan.as_str()))
                    .filter(products::boost_expires_at.lt(now))
                    .select(products::id)
                    .limit(limit)
                    .load::<Uuid>(&mut conn)?,
                BoostTarget::Service => services::table
                    .filter(services::boost_name.ne(BoostName::NoPlan.as_str()))
                    .filter(services::boost_expires_at.lt(now))
                    .select(services::id)
                    .limit(limit)
                    .load::<Uuid>(&mut conn)?,
            };

            Ok(result)
        })
        .await??)
    }

    async fn list_subscriptions_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExpiryCandidate>> {
        let db_pool = Arc::clone(&self.db_pool);
        let paid_plans: Vec<&'static str> = PlanName::PAID.iter().map(|plan| plan.as_str()).collect();

        Ok(task::spawn_blocking(move || -> Result<Vec<ExpiryCandidate>> {
            let mut conn = db_pool.get()?;

            let rows = users::table
                .filter(users::subscription_name.eq_any(paid_plans))
                .filter(users::subscription_status.eq(SubscriptionStatus::Active.to_string()))
                .filter(users::subscription_expires_at.ge(from))
                .filter(users::subscription_expires_at.le(to))
                .select((
                    users::id,
                    users::id,
                    users::subscription_name,
                    users::subscription_name,
                    users::subscription_expires_at,
                    users::device_tokens,
                ))
                .limit(limit)
                .load::<ExpiryRow>(&mut conn)?;

            Ok(into_candidates(rows))
        })
        .await??)
    }

    async fn list_boosts_expiring_between(
        &self,
        target: BoostTarget,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExpiryCandidate>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<ExpiryCandidate>> {
            let mut conn = db_pool.get()?;

            let rows = match target {
                BoostTarget::Product => products::table
                    .inner_join(users::table)
                    .filter(products::boost_name.ne(BoostName::NoPlan.as_str()))
                    .filter(products::boost_expires_at.ge(from))
                    .filter(products::boost_expires_at.le(to))
                    .select((
                        products::id,
                        products::seller_id,
                        products::title,
                        products::boost_name,
                        products::boost_expires_at,
                        users::device_tokens,
                    ))
                    .limit(limit)
                    .load::<ExpiryRow>(&mut conn)?,
                BoostTarget::Service => services::table
                    .inner_join(users::table)
                    .filter(services::boost_name.ne(BoostName::NoPlan.as_str()))
                    .filter(services::boost_expires_at.ge(from))
                    .filter(services::boost_expires_at.le(to))
                    .select((
                        services::id,
                        services::provider_id,
                        services::title,
                        services::boost_name,
                        services::boost_expires_at,
                        users::device_tokens,
                    ))
                    .limit(limit)
                    .load::<ExpiryRow>(&mut conn)?,
            };

            Ok(into_candidates(rows))
        })
        .await??)
    }

    async fn restore_abandoned_transient_orders(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<usize> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get()?;

            let restored = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
                let order_ids = transient_orders::table
                    .filter(transient_orders::created_at.lt(created_before))
                    .select(transient_orders::id)
                    .limit(limit)
                    .for_update()
                    .skip_locked()
                    .load::<Uuid>(conn)?;

                if order_ids.is_empty() {
                    return Ok(0);
                }

                let items = transient_order_items::table
                    .filter(transient_order_items::transient_order_id.eq_any(&order_ids))
                    .select(TransientOrderItemRow::as_select())
                    .load(conn)?;

                for item in &items {
                    update(products::table.find(item.product_id))
                        .set(products::quantity.eq(products::quantity + item.quantity))
                        .execute(conn)?;
                }

                delete(
                    transient_order_items::table
                        .filter(transient_order_items::transient_order_id.eq_any(&order_ids)),
                )
                .execute(conn)?;

                delete(transient_orders::table.filter(transient_orders::id.eq_any(&order_ids)))
                    .execute(conn)
            })?;

            Ok(restored)
        })
        .await??)
    }

    async fn list_admin_profit_accruals(&self, limit: i64) -> Result<Vec<AdminProfitAccrual>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<AdminProfitAccrual>> {
            let mut conn = db_pool.get()?;

            let result = admin_profit_accruals::table
                .select(AdminProfitAccrual::as_select())
                .limit(limit)
                .load::<AdminProfitAccrual>(&mut conn)?;

            Ok(result)
        })
        .await??)
    }

    async fn list_due_broadcasts(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AdminNotification>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<AdminNotification>> {
            let mut conn = db_pool.get()?;

            let result = admin_notifications::table
                .filter(admin_notifications::kind.eq(NotificationKind::Schedule.as_str()))
                .filter(admin_notifications::schedule_date.le(now))
                .filter(admin_notifications::sent_date.is_null())
                .select(AdminNotification::as_select())
                .limit(limit)
                .load::<AdminNotification>(&mut conn)?;

            Ok(result)
        })
        .await??)
    }

    async fn list_client_recipients(&self) -> Result<Vec<Recipient>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<Recipient>> {
            let mut conn = db_pool.get()?;

            let rows = users::table
                .filter(users::role.eq(UserRole::Client.to_string()))
                .select((users::id, users::device_tokens))
                .load::<(Uuid, Vec<String>)>(&mut conn)?;

            Ok(rows
                .into_iter()
                .map(|(user_id, device_tokens)| Recipient {
                    user_id,
                    device_tokens,
                })
                .collect())
        })
        .await??)
    }

    async fn mark_broadcast_sent(
        &self,
        notification_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(
                admin_notifications::table
                    .find(notification_id)
                    .filter(admin_notifications::sent_date.is_null()),
            )
            .set(admin_notifications::sent_date.eq(Some(sent_at)))
            .execute(&mut conn)?;

            Ok(())
        })
        .await??)
    }
}
