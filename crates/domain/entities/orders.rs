use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{cart_items, purchased_order_items, purchased_orders};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(table_name = purchased_orders)]
pub struct PurchasedOrder {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub payment_intent_id: String,
    pub total_minor: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Selectable, Queryable, Insertable)]
#[diesel(table_name = purchased_order_items)]
pub struct PurchasedOrderItem {
    pub purchased_order_id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub price_minor: i64,
    pub quantity: i32,
}

/// A settled order together with its line items, written in one insert pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchasedOrder {
    pub order: PurchasedOrder,
    pub items: Vec<PurchasedOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Selectable, Queryable, Insertable)]
#[diesel(table_name = cart_items)]
pub struct CartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}
