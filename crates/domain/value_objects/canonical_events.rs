use chrono::{DateTime, Utc};
use serde::Serialize;

use super::enums::{plan_names::PlanName, platforms::Platform};

/// Provider-agnostic payment occurrence. Every adapter produces one of these and
/// the reconciliation engine consumes it with a single exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanonicalEvent {
    PaymentSucceeded {
        provider_reference: String,
        amount_minor: Option<i64>,
    },
    PaymentMethodDetached {
        payment_method_id: String,
    },
    CustomerDeleted {
        customer_id: String,
    },
    Subscription(SubscriptionEvent),
    PendingPurchaseCanceled {
        platform: Platform,
        transaction_id: String,
    },
}

impl CanonicalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalEvent::PaymentSucceeded { .. } => "payment_succeeded",
            CanonicalEvent::PaymentMethodDetached { .. } => "payment_method_detached",
            CanonicalEvent::CustomerDeleted { .. } => "customer_deleted",
            CanonicalEvent::Subscription(event) => event.kind.as_str(),
            CanonicalEvent::PendingPurchaseCanceled { .. } => "pending_purchase_canceled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionEventKind {
    Purchased,
    Renewed,
    InteractiveRenewal,
    Recovered,
    PlanChanged,
    Cancelled,
    Revoked,
    Expired,
    Refunded,
    FailedToRenew,
}

impl SubscriptionEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionEventKind::Purchased => "purchased",
            SubscriptionEventKind::Renewed => "renewed",
            SubscriptionEventKind::InteractiveRenewal => "interactive_renewal",
            SubscriptionEventKind::Recovered => "recovered",
            SubscriptionEventKind::PlanChanged => "plan_changed",
            SubscriptionEventKind::Cancelled => "cancelled",
            SubscriptionEventKind::Revoked => "revoked",
            SubscriptionEventKind::Expired => "expired",
            SubscriptionEventKind::Refunded => "refunded",
            SubscriptionEventKind::FailedToRenew => "failed_to_renew",
        }
    }

    /// Kinds that keep or grant a paid plan and therefore need a billing period.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SubscriptionEventKind::Purchased
                | SubscriptionEventKind::Renewed
                | SubscriptionEventKind::InteractiveRenewal
                | SubscriptionEventKind::Recovered
        )
    }
}

impl std::fmt::Display for SubscriptionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionEvent {
    pub platform: Platform,
    pub kind: SubscriptionEventKind,
    pub transaction_id: String,
    pub plan: Option<PlanName>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub price_minor: Option<i64>,
}

impl SubscriptionEvent {
    pub fn new(platform: Platform, kind: SubscriptionEventKind, transaction_id: String) -> Self {
        Self {
            platform,
            kind,
            transaction_id,
            plan: None,
            purchased_at: None,
            expires_at: None,
            price_minor: None,
        }
    }
}
