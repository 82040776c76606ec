use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{boost_names::BoostName, boost_targets::BoostTarget},
    infra::db::postgres::schema::{products, services},
};

/// Boost state of a product or service. `No Plan` carries neither a transaction nor an expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostPlan {
    pub transaction_id: Option<String>,
    pub name: BoostName,
    pub purchased_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BoostPlan {
    pub fn none() -> Self {
        Self {
            transaction_id: None,
            name: BoostName::NoPlan,
            purchased_at: None,
            expires_at: None,
        }
    }

    /// Returns `None` for `No Plan`, which cannot be purchased.
    pub fn purchase(name: BoostName, transaction_id: String, purchased_at: DateTime<Utc>) -> Option<Self> {
        let duration = name.duration()?;
        Some(Self {
            transaction_id: Some(transaction_id),
            name,
            purchased_at: Some(purchased_at),
            expires_at: Some(purchased_at + duration),
        })
    }

    pub fn is_boosted(&self, now: DateTime<Utc>) -> bool {
        self.name != BoostName::NoPlan && self.expires_at.is_some_and(|expires_at| expires_at > now)
    }
}

/// A boostable listing. Products carry stock, services do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: Uuid,
    pub target: BoostTarget,
    pub owner_id: Uuid,
    pub title: String,
    pub price_minor: Option<i64>,
    pub quantity: Option<i32>,
    pub is_active: bool,
    pub boost: BoostPlan,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = products)]
pub struct ProductRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_minor: i64,
    pub quantity: i32,
    pub is_active: bool,
    pub boost_transaction_id: Option<String>,
    pub boost_name: String,
    pub boost_purchased_at: Option<DateTime<Utc>>,
    pub boost_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = services)]
pub struct ServiceRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub boost_transaction_id: Option<String>,
    pub boost_name: String,
    pub boost_purchased_at: Option<DateTime<Utc>>,
    pub boost_expires_at: Option<DateTime<Utc>>,
}

fn boost_from_columns(
    transaction_id: Option<String>,
    name: &str,
    purchased_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> BoostPlan {
    BoostPlan {
        transaction_id,
        name: name.parse().unwrap_or_default(),
        purchased_at,
        expires_at,
    }
}

impl From<ProductRow> for Listing {
    fn from(value: ProductRow) -> Self {
        Self {
            id: value.id,
            target: BoostTarget::Product,
            owner_id: value.seller_id,
            title: value.title,
            price_minor: Some(value.price_minor),
            quantity: Some(value.quantity),
            is_active: value.is_active,
            boost: boost_from_columns(
                value.boost_transaction_id,
                &value.boost_name,
                value.boost_purchased_at,
                value.boost_expires_at,
            ),
        }
    }
}

impl From<ServiceRow> for Listing {
    fn from(value: ServiceRow) -> Self {
        Self {
            id: value.id,
            target: BoostTarget::Service,
            owner_id: value.provider_id,
            title: value.title,
            price_minor: None,
            quantity: None,
            is_active: value.is_active,
            boost: boost_from_columns(
                value.boost_transaction_id,
                &value.boost_name,
                value.boost_purchased_at,
                value.boost_expires_at,
            ),
        }
    }
}
