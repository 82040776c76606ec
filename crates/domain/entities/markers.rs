use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        boost_names::BoostName, boost_targets::BoostTarget, plan_names::PlanName,
        platforms::Platform,
    },
    infra::db::postgres::schema::{
        boost_intents, subscription_intents, transient_order_items, transient_orders,
        wallet_top_ups,
    },
};

/// A checkout awaiting payment. Stock for its items is reserved until it settles or expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientOrder {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub payment_intent_id: String,
    pub total_minor: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransientOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientOrderItem {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub price_minor: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(table_name = wallet_top_ups)]
pub struct WalletTopUp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_intent_id: String,
    pub amount_minor: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostIntent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub target: BoostTarget,
    pub listing_id: Uuid,
    pub boost_name: BoostName,
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

/// Keyed by `key`: the payment intent for Stripe, the original transaction id or
/// purchase token for the stores. `transaction_id` is what the plan is recorded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionIntent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub key: String,
    pub transaction_id: String,
    pub plan_name: PlanName,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMarker {
    TransientOrder(TransientOrder),
    WalletTopUp(WalletTopUp),
    Boost(BoostIntent),
    Subscription(SubscriptionIntent),
}

impl PendingMarker {
    pub fn key(&self) -> &str {
        match self {
            PendingMarker::TransientOrder(order) => &order.payment_intent_id,
            PendingMarker::WalletTopUp(top_up) => &top_up.payment_intent_id,
            PendingMarker::Boost(intent) => &intent.payment_intent_id,
            PendingMarker::Subscription(intent) => &intent.key,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PendingMarker::TransientOrder(_) => "transient_order",
            PendingMarker::WalletTopUp(_) => "wallet_top_up",
            PendingMarker::Boost(intent) => match intent.target {
                BoostTarget::Product => "product_boost_intent",
                BoostTarget::Service => "service_boost_intent",
            },
            PendingMarker::Subscription(_) => "subscription_intent",
        }
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(table_name = transient_orders)]
pub struct TransientOrderRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub payment_intent_id: String,
    pub total_minor: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Selectable, Queryable, Insertable)]
#[diesel(table_name = transient_order_items)]
pub struct TransientOrderItemRow {
    pub transient_order_id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub price_minor: i64,
    pub quantity: i32,
}

impl TransientOrderRow {
    pub fn into_order(self, items: Vec<TransientOrderItemRow>) -> TransientOrder {
        TransientOrder {
            id: self.id,
            buyer_id: self.buyer_id,
            payment_intent_id: self.payment_intent_id,
            total_minor: self.total_minor,
            created_at: self.created_at,
            items: items
                .into_iter()
                .map(|item| TransientOrderItem {
                    product_id: item.product_id,
                    seller_id: item.seller_id,
                    price_minor: item.price_minor,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(table_name = boost_intents)]
pub struct BoostIntentRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub target: String,
    pub listing_id: Uuid,
    pub boost_name: String,
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BoostIntentRow> for BoostIntent {
    type Error = String;

    fn try_from(value: BoostIntentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            owner_id: value.owner_id,
            target: value.target.parse()?,
            listing_id: value.listing_id,
            boost_name: value.boost_name.parse()?,
            payment_intent_id: value.payment_intent_id,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(table_name = subscription_intents)]
pub struct SubscriptionIntentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub intent_key: String,
    pub transaction_id: String,
    pub plan_name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionIntentRow> for SubscriptionIntent {
    type Error = String;

    fn try_from(value: SubscriptionIntentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            platform: value.platform.parse()?,
            key: value.intent_key,
            transaction_id: value.transaction_id,
            plan_name: value.plan_name.parse()?,
            created_at: value.created_at,
        })
    }
}
