use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        platforms::Platform, revenue_kinds::RevenueKind,
        wallet_transaction_kinds::WalletTransactionKind,
    },
    infra::db::postgres::schema::{admin_profit_accruals, revenue_entries, wallet_transactions},
};

/// Append-only audit record of a completed monetary entitlement change.
/// Only `cancelled_at` is ever written after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub transaction_id: String,
    pub plan_name: String,
    pub purchased_at: DateTime<Utc>,
    pub renewed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub price_minor: i64,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub kind: RevenueKind,
}

#[derive(Debug, Clone, Selectable, Queryable, Insertable)]
#[diesel(table_name = revenue_entries)]
pub struct RevenueEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub transaction_id: String,
    pub plan_name: String,
    pub purchased_at: DateTime<Utc>,
    pub renewed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub price_minor: i64,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub kind: String,
}

impl From<&RevenueEntry> for RevenueEntryRow {
    fn from(value: &RevenueEntry) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            platform: value.platform.to_string(),
            transaction_id: value.transaction_id.clone(),
            plan_name: value.plan_name.clone(),
            purchased_at: value.purchased_at,
            renewed_at: value.renewed_at,
            expires_at: value.expires_at,
            price_minor: value.price_minor,
            cancelled_at: value.cancelled_at,
            kind: value.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub kind: WalletTransactionKind,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_transactions)]
pub struct WalletTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub kind: String,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl From<&WalletTransaction> for WalletTransactionRow {
    fn from(value: &WalletTransaction) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            amount_minor: value.amount_minor,
            kind: value.kind.to_string(),
            reference: value.reference.clone(),
            created_at: value.created_at,
        }
    }
}

/// Platform share of a Stripe payment, realized once the balance transaction settles.
#[derive(Debug, Clone, PartialEq, Eq, Selectable, Queryable, Insertable)]
#[diesel(table_name = admin_profit_accruals)]
pub struct AdminProfitAccrual {
    pub payment_intent_id: String,
    pub transfer_amount_minor: i64,
    pub created_at: DateTime<Utc>,
}
