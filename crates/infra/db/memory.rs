//! In-memory Entitlement Store. Each transaction works on a clone of the state and
//! swaps it in only when the unit of work succeeds, so rollbacks are exact.

use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::{
        ledger::{AdminProfitAccrual, RevenueEntry, WalletTransaction},
        listings::{BoostPlan, Listing},
        markers::{PendingMarker, TransientOrder},
        notifications::AdminNotification,
        orders::{CartItem, NewPurchasedOrder},
        users::{SubscriptionPlan, UserEntitlement},
    },
    repositories::entitlement_store::{
        EntitlementStore, EntitlementTx, ExpiryCandidate, Recipient, TxError, TxResult,
    },
    value_objects::enums::{
        boost_names::BoostName, boost_targets::BoostTarget, notification_kinds::NotificationKind,
        plan_names::PlanName, platforms::Platform, subscription_statuses::SubscriptionStatus,
        user_roles::UserRole,
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: HashMap<Uuid, UserEntitlement>,
    pub listings: HashMap<(BoostTarget, Uuid), Listing>,
    pub cart_items: Vec<CartItem>,
    pub markers: HashMap<String, PendingMarker>,
    pub purchased_orders: Vec<NewPurchasedOrder>,
    pub revenue_entries: Vec<RevenueEntry>,
    pub wallet_transactions: Vec<WalletTransaction>,
    pub admin_profit_accruals: HashMap<String, AdminProfitAccrual>,
    pub admin_profit_minor: i64,
    pub admin_notifications: Vec<AdminNotification>,
}

impl MemoryState {
    pub fn user(&self, user_id: Uuid) -> Option<&UserEntitlement> {
        self.users.get(&user_id)
    }

    pub fn listing(&self, target: BoostTarget, listing_id: Uuid) -> Option<&Listing> {
        self.listings.get(&(target, listing_id))
    }
}

struct MemoryTx<'s> {
    state: &'s mut MemoryState,
}

impl EntitlementTx for MemoryTx<'_> {
    fn find_marker(&mut self, key: &str) -> TxResult<Option<PendingMarker>> {
        Ok(self.state.markers.get(key).cloned())
    }

    fn delete_marker(&mut self, marker: &PendingMarker) -> TxResult<()> {
        self.state.markers.remove(marker.key());
        Ok(())
    }

    fn find_user(&mut self, user_id: Uuid) -> TxResult<Option<UserEntitlement>> {
        Ok(self.state.users.get(&user_id).cloned())
    }

    fn find_user_by_subscription(
        &mut self,
        platform: Platform,
        transaction_id: &str,
    ) -> TxResult<Option<UserEntitlement>> {
        Ok(self
            .state
            .users
            .values()
            .find(|user| {
                user.subscription.platform == platform
                    && user.subscription.transaction_id.as_deref() == Some(transaction_id)
            })
            .cloned())
    }

    fn update_subscription(&mut self, user_id: Uuid, plan: &SubscriptionPlan) -> TxResult<()> {
        if let Some(user) = self.state.users.get_mut(&user_id) {
            user.subscription = plan.clone();
        }
        Ok(())
    }

    fn credit_wallet(&mut self, user_id: Uuid, amount_minor: i64) -> TxResult<()> {
        let user = self
            .state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| TxError::precondition(format!("wallet owner {user_id} not found")))?;
        user.wallet_balance_minor += amount_minor;
        Ok(())
    }

    fn clear_stripe_payment_method(&mut self, payment_method_id: &str) -> TxResult<usize> {
        let mut updated = 0;
        for user in self.state.users.values_mut() {
            if user.stripe_default_payment_method.as_deref() == Some(payment_method_id) {
                user.stripe_default_payment_method = None;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn clear_stripe_customer(&mut self, customer_id: &str) -> TxResult<usize> {
        let mut updated = 0;
        for user in self.state.users.values_mut() {
            if user.stripe_customer_id.as_deref() == Some(customer_id) {
                user.stripe_customer_id = None;
                user.stripe_default_payment_method = None;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn find_listing(&mut self, target: BoostTarget, listing_id: Uuid) -> TxResult<Option<Listing>> {
        Ok(self.state.listings.get(&(target, listing_id)).cloned())
    }

    fn update_boost(
        &mut self,
        target: BoostTarget,
        listing_id: Uuid,
        boost: &BoostPlan,
    ) -> TxResult<()> {
        if let Some(listing) = self.state.listings.get_mut(&(target, listing_id)) {
            listing.boost = boost.clone();
        }
        Ok(())
    }

    fn insert_purchased_order(&mut self, order: &NewPurchasedOrder) -> TxResult<()> {
        self.state.purchased_orders.push(order.clone());
        Ok(())
    }

    fn clear_cart(&mut self, user_id: Uuid) -> TxResult<()> {
        self.state.cart_items.retain(|item| item.user_id != user_id);
        Ok(())
    }

    fn append_revenue(&mut self, entry: &RevenueEntry) -> TxResult<()> {
        self.state.revenue_entries.push(entry.clone());
        Ok(())
    }

    fn stamp_revenue_cancelled(
        &mut self,
        platform: Platform,
        transaction_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> TxResult<usize> {
        let mut updated = 0;
        for entry in self.state.revenue_entries.iter_mut().filter(|entry| {
            entry.platform == platform
                && entry.transaction_id == transaction_id
                && entry.cancelled_at.is_none()
        }) {
            entry.cancelled_at = Some(cancelled_at);
            updated += 1;
        }
        Ok(updated)
    }

    fn append_wallet_transaction(&mut self, transaction: &WalletTransaction) -> TxResult<()> {
        self.state.wallet_transactions.push(transaction.clone());
        Ok(())
    }

    fn insert_admin_profit_accrual(&mut self, accrual: &AdminProfitAccrual) -> TxResult<()> {
        if self
            .state
            .admin_profit_accruals
            .contains_key(&accrual.payment_intent_id)
        {
            return Err(TxError::Store(anyhow!(
                "duplicate admin profit accrual {}",
                accrual.payment_intent_id
            )));
        }
        self.state
            .admin_profit_accruals
            .insert(accrual.payment_intent_id.clone(), accrual.clone());
        Ok(())
    }

    fn find_admin_profit_accrual(
        &mut self,
        payment_intent_id: &str,
    ) -> TxResult<Option<AdminProfitAccrual>> {
        Ok(self.state.admin_profit_accruals.get(payment_intent_id).cloned())
    }

    fn delete_admin_profit_accrual(&mut self, payment_intent_id: &str) -> TxResult<()> {
        self.state.admin_profit_accruals.remove(payment_intent_id);
        Ok(())
    }

    fn add_admin_profit(&mut self, profit_minor: i64) -> TxResult<()> {
        self.state.admin_profit_minor += profit_minor;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryEntitlementStore {
    state: Mutex<MemoryState>,
    fail_before_commit: AtomicBool,
}

impl MemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every subsequent transaction fail after its work ran but before commit.
    pub fn set_fail_before_commit(&self, fail: bool) {
        self.fail_before_commit.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MemoryState {
        self.lock().clone()
    }

    pub fn insert_user(&self, user: UserEntitlement) {
        self.lock().users.insert(user.id, user);
    }

    pub fn insert_listing(&self, listing: Listing) {
        self.lock()
            .listings
            .insert((listing.target, listing.id), listing);
    }

    pub fn insert_marker(&self, marker: PendingMarker) {
        self.lock().markers.insert(marker.key().to_string(), marker);
    }

    pub fn insert_cart_item(&self, item: CartItem) {
        self.lock().cart_items.push(item);
    }

    pub fn insert_admin_profit_accrual(&self, accrual: AdminProfitAccrual) {
        self.lock()
            .admin_profit_accruals
            .insert(accrual.payment_intent_id.clone(), accrual);
    }

    pub fn insert_admin_notification(&self, notification: AdminNotification) {
        self.lock().admin_notifications.push(notification);
    }
}

fn transient_orders(state: &MemoryState) -> impl Iterator<Item = &TransientOrder> {
    state.markers.values().filter_map(|marker| match marker {
        PendingMarker::TransientOrder(order) => Some(order),
        _ => None,
    })
}

#[async_trait]
impl EntitlementStore for MemoryEntitlementStore {
    async fn transaction<R, F>(&self, work: F) -> TxResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn EntitlementTx) -> TxResult<R> + Send + 'static,
    {
        let mut guard = self.lock();
        let mut working = guard.clone();

        let result = work(&mut MemoryTx {
            state: &mut working,
        })?;

        if self.fail_before_commit.load(Ordering::SeqCst) {
            return Err(TxError::Store(anyhow!("simulated failure before commit")));
        }

        *guard = working;
        Ok(result)
    }

    async fn list_expired_free_plan_users(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .filter(|user| {
                user.subscription.name == PlanName::FreePlan
                    && user.subscription.expires_at.is_some_and(|at| at < now)
            })
            .map(|user| user.id)
            .take(limit as usize)
            .collect())
    }

    async fn list_expired_boosts(
        &self,
        target: BoostTarget,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        let state = self.lock();
        Ok(state
            .listings
            .values()
            .filter(|listing| {
                listing.target == target
                    && listing.boost.name != BoostName::NoPlan
                    && listing.boost.expires_at.is_some_and(|at| at < now)
            })
            .map(|listing| listing.id)
            .take(limit as usize)
            .collect())
    }

    async fn list_subscriptions_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExpiryCandidate>> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .filter(|user| {
                user.subscription.is_paid() && user.subscription.status == SubscriptionStatus::Active
            })
            .filter_map(|user| {
                let expires_at = user.subscription.expires_at?;
                (from <= expires_at && expires_at <= to).then(|| ExpiryCandidate {
                    id: user.id,
                    owner_id: user.id,
                    title: user.subscription.name.to_string(),
                    plan_name: user.subscription.name.to_string(),
                    expires_at,
                    device_tokens: user.device_tokens.clone(),
                })
            })
            .take(limit as usize)
            .collect())
    }

    async fn list_boosts_expiring_between(
        &self,
        target: BoostTarget,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ExpiryCandidate>> {
        let state = self.lock();
        Ok(state
            .listings
            .values()
            .filter(|listing| listing.target == target && listing.boost.name != BoostName::NoPlan)
            .filter_map(|listing| {
                let expires_at = listing.boost.expires_at?;
                let owner = state.users.get(&listing.owner_id)?;
                (from <= expires_at && expires_at <= to).then(|| ExpiryCandidate {
                    id: listing.id,
                    owner_id: listing.owner_id,
                    title: listing.title.clone(),
                    plan_name: listing.boost.name.to_string(),
                    expires_at,
                    device_tokens: owner.device_tokens.clone(),
                })
            })
            .take(limit as usize)
            .collect())
    }

    async fn restore_abandoned_transient_orders(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<usize> {
        let mut state = self.lock();

        let expired: Vec<TransientOrder> = transient_orders(&state)
            .filter(|order| order.created_at < created_before)
            .take(limit as usize)
            .cloned()
            .collect();

        for order in &expired {
            for item in &order.items {
                if let Some(product) = state
                    .listings
                    .get_mut(&(BoostTarget::Product, item.product_id))
                {
                    product.quantity = product.quantity.map(|stock| stock + item.quantity);
                }
            }
            state.markers.remove(&order.payment_intent_id);
        }

        Ok(expired.len())
    }

    async fn list_admin_profit_accruals(&self, limit: i64) -> Result<Vec<AdminProfitAccrual>> {
        let state = self.lock();
        Ok(state
            .admin_profit_accruals
            .values()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_due_broadcasts(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AdminNotification>> {
        let state = self.lock();
        Ok(state
            .admin_notifications
            .iter()
            .filter(|notification| {
                notification.kind == NotificationKind::Schedule.as_str()
                    && notification.schedule_date.is_some_and(|at| at <= now)
                    && notification.sent_date.is_none()
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_client_recipients(&self) -> Result<Vec<Recipient>> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .filter(|user| user.role == UserRole::Client)
            .map(|user| Recipient {
                user_id: user.id,
                device_tokens: user.device_tokens.clone(),
            })
            .collect())
    }

    async fn mark_broadcast_sent(
        &self,
        notification_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.lock();
        if let Some(notification) = state
            .admin_notifications
            .iter_mut()
            .find(|notification| notification.id == notification_id && notification.sent_date.is_none())
        {
            notification.sent_date = Some(sent_at);
        }
        Ok(())
    }
}
