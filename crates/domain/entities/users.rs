use chrono::{DateTime, Duration, Months, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::{
            plan_names::PlanName, platforms::Platform, subscription_statuses::SubscriptionStatus,
            user_roles::UserRole,
        },
        plans::{FREE_PLAN_BENEFITS, PlanBenefits},
    },
    infra::db::postgres::schema::users,
};

/// One calendar month after `at`, clamped to the last day of a shorter month.
pub fn one_month_after(at: DateTime<Utc>) -> DateTime<Utc> {
    at.checked_add_months(Months::new(1))
        .unwrap_or_else(|| at + Duration::days(30))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub platform: Platform,
    pub transaction_id: Option<String>,
    pub name: PlanName,
    pub available_postings: i32,
    pub available_boosts: i32,
    pub wishlist_feature: bool,
    pub purchased_at: Option<DateTime<Utc>>,
    pub renewed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
}

impl SubscriptionPlan {
    /// Free Plan defaults, valid for one calendar month from `now`.
    pub fn free(now: DateTime<Utc>) -> Self {
        Self {
            platform: Platform::None,
            transaction_id: None,
            name: PlanName::FreePlan,
            available_postings: FREE_PLAN_BENEFITS.available_postings,
            available_boosts: FREE_PLAN_BENEFITS.available_boosts,
            wishlist_feature: FREE_PLAN_BENEFITS.wishlist_feature,
            purchased_at: Some(now),
            renewed_at: None,
            expires_at: Some(one_month_after(now)),
            status: SubscriptionStatus::Active,
        }
    }

    pub fn activate(
        platform: Platform,
        transaction_id: String,
        name: PlanName,
        benefits: PlanBenefits,
        purchased_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            platform,
            transaction_id: Some(transaction_id),
            name,
            available_postings: benefits.available_postings,
            available_boosts: benefits.available_boosts,
            wishlist_feature: benefits.wishlist_feature,
            purchased_at: Some(purchased_at),
            renewed_at: None,
            expires_at: Some(expires_at),
            status: SubscriptionStatus::Active,
        }
    }

    /// Same transaction, refreshed benefits and a later expiry.
    pub fn renew(
        &self,
        name: PlanName,
        benefits: PlanBenefits,
        renewed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            available_postings: benefits.available_postings,
            available_boosts: benefits.available_boosts,
            wishlist_feature: benefits.wishlist_feature,
            renewed_at: Some(renewed_at),
            expires_at: Some(expires_at),
            status: SubscriptionStatus::Active,
            ..self.clone()
        }
    }

    /// Applies another plan's benefits, keeping the expiry unless a later one is given.
    pub fn with_plan(
        &self,
        name: PlanName,
        benefits: PlanBenefits,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let expires_at = match (self.expires_at, expires_at) {
            (Some(current), Some(candidate)) if candidate > current => Some(candidate),
            (None, candidate) => candidate,
            (current, _) => current,
        };

        Self {
            name,
            available_postings: benefits.available_postings,
            available_boosts: benefits.available_boosts,
            wishlist_feature: benefits.wishlist_feature,
            expires_at,
            ..self.clone()
        }
    }

    pub fn is_free(&self) -> bool {
        self.name == PlanName::FreePlan
    }

    pub fn is_paid(&self) -> bool {
        self.name.is_paid()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntitlement {
    pub id: Uuid,
    pub role: UserRole,
    pub wallet_balance_minor: i64,
    pub device_tokens: Vec<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_default_payment_method: Option<String>,
    pub subscription: SubscriptionPlan,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserRow {
    pub id: Uuid,
    pub role: String,
    pub wallet_balance_minor: i64,
    pub device_tokens: Vec<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_default_payment_method: Option<String>,
    pub subscription_platform: String,
    pub subscription_transaction_id: Option<String>,
    pub subscription_name: String,
    pub subscription_available_postings: i32,
    pub subscription_available_boosts: i32,
    pub subscription_wishlist_feature: bool,
    pub subscription_purchased_at: Option<DateTime<Utc>>,
    pub subscription_renewed_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub subscription_status: String,
}

impl From<UserRow> for UserEntitlement {
    fn from(value: UserRow) -> Self {
        Self {
            id: value.id,
            role: UserRole::from_str(&value.role),
            wallet_balance_minor: value.wallet_balance_minor,
            device_tokens: value.device_tokens,
            stripe_customer_id: value.stripe_customer_id,
            stripe_default_payment_method: value.stripe_default_payment_method,
            subscription: SubscriptionPlan {
                platform: value.subscription_platform.parse().unwrap_or_default(),
                transaction_id: value.subscription_transaction_id,
                name: value.subscription_name.parse().unwrap_or_default(),
                available_postings: value.subscription_available_postings,
                available_boosts: value.subscription_available_boosts,
                wishlist_feature: value.subscription_wishlist_feature,
                purchased_at: value.subscription_purchased_at,
                renewed_at: value.subscription_renewed_at,
                expires_at: value.subscription_expires_at,
                status: SubscriptionStatus::from_str(&value.subscription_status),
            },
        }
    }
}

/// Changeset writing every subscription column; `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users, treat_none_as_null = true)]
pub struct SubscriptionChangeset {
    pub subscription_platform: String,
    pub subscription_transaction_id: Option<String>,
    pub subscription_name: String,
    pub subscription_available_postings: i32,
    pub subscription_available_boosts: i32,
    pub subscription_wishlist_feature: bool,
    pub subscription_purchased_at: Option<DateTime<Utc>>,
    pub subscription_renewed_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub subscription_status: String,
}

impl From<&SubscriptionPlan> for SubscriptionChangeset {
    fn from(plan: &SubscriptionPlan) -> Self {
        Self {
            subscription_platform: plan.platform.to_string(),
            subscription_transaction_id: plan.transaction_id.clone(),
            subscription_name: plan.name.to_string(),
            subscription_available_postings: plan.available_postings,
            subscription_available_boosts: plan.available_boosts,
            subscription_wishlist_feature: plan.wishlist_feature,
            subscription_purchased_at: plan.purchased_at,
            subscription_renewed_at: plan.renewed_at,
            subscription_expires_at: plan.expires_at,
            subscription_status: plan.status.to_string(),
        }
    }
}
