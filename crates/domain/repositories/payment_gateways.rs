use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

/// Realized amounts of a settled Stripe payment, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub amount_minor: i64,
    pub fee_minor: i64,
}

#[automock]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    /// Looks up the balance transaction behind a payment intent's latest charge.
    async fn fetch_settlement(&self, payment_intent_id: &str) -> Result<Settlement>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoogleSubscriptionPurchase {
    pub order_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub price_minor: Option<i64>,
}

#[automock]
#[async_trait]
pub trait GooglePlayGateway: Send + Sync {
    async fn get_subscription(
        &self,
        subscription_id: &str,
        purchase_token: &str,
    ) -> Result<GoogleSubscriptionPurchase>;
}
