use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::{
        ledger::{AdminProfitAccrual, RevenueEntry, WalletTransaction},
        listings::{BoostPlan, Listing},
        markers::PendingMarker,
        notifications::AdminNotification,
        orders::NewPurchasedOrder,
        users::{SubscriptionPlan, UserEntitlement},
    },
    value_objects::enums::{boost_targets::BoostTarget, platforms::Platform},
};

/// Failure of a unit of work. Either way the transaction is rolled back.
#[derive(Debug, Error)]
pub enum TxError {
    /// A business precondition no longer holds. Not retried.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// The store itself failed; the caller may retry later.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl TxError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        TxError::Precondition(reason.into())
    }
}

pub type TxResult<T> = std::result::Result<T, TxError>;

/// Reads and writes available inside one store transaction. Reads of rows that the
/// caller is about to mutate take a row lock.
pub trait EntitlementTx {
    fn find_marker(&mut self, key: &str) -> TxResult<Option<PendingMarker>>;
    fn delete_marker(&mut self, marker: &PendingMarker) -> TxResult<()>;

    fn find_user(&mut self, user_id: Uuid) -> TxResult<Option<UserEntitlement>>;
    fn find_user_by_subscription(
        &mut self,
        platform: Platform,
        transaction_id: &str,
    ) -> TxResult<Option<UserEntitlement>>;
    fn update_subscription(&mut self, user_id: Uuid, plan: &SubscriptionPlan) -> TxResult<()>;
    fn credit_wallet(&mut self, user_id: Uuid, amount_minor: i64) -> TxResult<()>;
    fn clear_stripe_payment_method(&mut self, payment_method_id: &str) -> TxResult<usize>;
    fn clear_stripe_customer(&mut self, customer_id: &str) -> TxResult<usize>;

    fn find_listing(&mut self, target: BoostTarget, listing_id: Uuid) -> TxResult<Option<Listing>>;
    fn update_boost(
        &mut self,
        target: BoostTarget,
        listing_id: Uuid,
        boost: &BoostPlan,
    ) -> TxResult<()>;

    fn insert_purchased_order(&mut self, order: &NewPurchasedOrder) -> TxResult<()>;
    fn clear_cart(&mut self, user_id: Uuid) -> TxResult<()>;

    fn append_revenue(&mut self, entry: &RevenueEntry) -> TxResult<()>;
    fn stamp_revenue_cancelled(
        &mut self,
        platform: Platform,
        transaction_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> TxResult<usize>;
    fn append_wallet_transaction(&mut self, transaction: &WalletTransaction) -> TxResult<()>;

    fn insert_admin_profit_accrual(&mut self, accrual: &AdminProfitAccrual) -> TxResult<()>;
    fn find_admin_profit_accrual(
        &mut self,
        payment_intent_id: &str,
    ) -> TxResult<Option<AdminProfitAccrual>>;
    fn delete_admin_profit_accrual(&mut self, payment_intent_id: &str) -> TxResult<()>;
    fn add_admin_profit(&mut self, profit_minor: i64) -> TxResult<()>;
}

/// A user or listing whose entitlement is about to lapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryCandidate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub plan_name: String,
    pub expires_at: DateTime<Utc>,
    pub device_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Uuid,
    pub device_tokens: Vec<String>,
}

#[async_trait]
pub trait EntitlementStore: Send + Sync + 'static {
    /// Runs `work` in one transaction, committing only when it returns `Ok`.
    async fn transaction<R, F>(&self, work: F) -> TxResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn EntitlementTx) -> TxResult<R> + Send + 'static;

    async fn list_expired_free_plan_users(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>>;

    async fn list_expired_boosts(
        &self,
        target: BoostTarget,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>>;

    /// Active paid subscriptions with `from <= expires_at <= to`.
    async fn list_subscriptions_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExpiryCandidate>>;

    async fn list_boosts_expiring_between(
        &self,
        target: BoostTarget,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExpiryCandidate>>;

    /// Deletes transient orders created before `created_before` and returns their
    /// reserved quantities to stock. Returns the number of orders removed.
    async fn restore_abandoned_transient_orders(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<usize>;

    async fn list_admin_profit_accruals(&self, limit: i64) -> Result<Vec<AdminProfitAccrual>>;

    async fn list_due_broadcasts(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AdminNotification>>;

    async fn list_client_recipients(&self) -> Result<Vec<Recipient>>;

    async fn mark_broadcast_sent(&self, notification_id: Uuid, sent_at: DateTime<Utc>)
    -> Result<()>;
}
