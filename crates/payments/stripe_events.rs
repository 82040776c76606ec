use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{stripe_client::StripeEvent, webhook_error::WebhookError};
use crate::{
    config::stage::Stage,
    domain::value_objects::{
        canonical_events::{CanonicalEvent, SubscriptionEvent, SubscriptionEventKind},
        enums::{plan_names::PlanName, platforms::Platform},
    },
};

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    amount_received: Option<i64>,
    amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Deserialize, Default)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub price: Option<StripePrice>,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: Option<String>,
    pub lookup_key: Option<String>,
    pub unit_amount: Option<i64>,
}

impl StripeSubscription {
    /// Period start, falling back to the first item when the top-level field is absent.
    pub fn period_start(&self) -> Option<i64> {
        self.current_period_start.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_start)
        })
    }

    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_end)
        })
    }

    fn price(&self) -> Option<&StripePrice> {
        self.items.data.first().and_then(|item| item.price.as_ref())
    }

    /// Plan from the price lookup key, then the `plan_name` metadata, then the price id.
    pub fn plan(&self) -> Option<PlanName> {
        let price = self.price();
        price
            .and_then(|price| price.lookup_key.as_deref())
            .and_then(PlanName::from_provider_sku)
            .or_else(|| {
                self.metadata
                    .get("plan_name")
                    .and_then(|name| PlanName::from_provider_sku(name))
            })
            .or_else(|| {
                price
                    .and_then(|price| price.id.as_deref())
                    .and_then(PlanName::from_provider_sku)
            })
    }
}

fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn object<T: for<'de> Deserialize<'de>>(event: &StripeEvent) -> Result<T, WebhookError> {
    serde_json::from_value(event.data.object.clone()).map_err(|err| {
        WebhookError::Malformed(format!("{} object: {err}", event.type_))
    })
}

/// Production only accepts live events, every other stage only test-mode events.
pub fn livemode_matches(event: &StripeEvent, stage: Stage) -> bool {
    event.livemode.unwrap_or(false) == stage.is_production()
}

/// Translates a verified Stripe event into a canonical event.
pub fn decode_stripe_event(event: &StripeEvent, stage: Stage) -> Result<CanonicalEvent, WebhookError> {
    if !livemode_matches(event, stage) {
        return Err(WebhookError::Ignored(format!(
            "livemode={:?} does not match stage {stage}",
            event.livemode
        )));
    }

    match event.type_.as_str() {
        "payment_intent.succeeded" => {
            let intent: PaymentIntentObject = object(event)?;
            Ok(CanonicalEvent::PaymentSucceeded {
                provider_reference: intent.id,
                amount_minor: intent.amount_received.or(intent.amount),
            })
        }
        "payment_method.detached" => {
            let method: IdObject = object(event)?;
            Ok(CanonicalEvent::PaymentMethodDetached {
                payment_method_id: method.id,
            })
        }
        "customer.deleted" => {
            let customer: IdObject = object(event)?;
            Ok(CanonicalEvent::CustomerDeleted {
                customer_id: customer.id,
            })
        }
        "customer.subscription.deleted" => {
            let subscription: StripeSubscription = object(event)?;
            Ok(CanonicalEvent::Subscription(SubscriptionEvent::new(
                Platform::Stripe,
                SubscriptionEventKind::Cancelled,
                subscription.id,
            )))
        }
        "customer.subscription.updated" => {
            let subscription: StripeSubscription = object(event)?;
            subscription_updated(subscription)
        }
        other => Err(WebhookError::Ignored(format!("unhandled stripe event type {other}"))),
    }
}

fn subscription_updated(subscription: StripeSubscription) -> Result<CanonicalEvent, WebhookError> {
    let status = subscription.status.clone().unwrap_or_default();
    let kind = match status.as_str() {
        "active" | "trialing" => SubscriptionEventKind::Renewed,
        "past_due" => SubscriptionEventKind::FailedToRenew,
        "canceled" | "unpaid" | "incomplete_expired" => SubscriptionEventKind::Cancelled,
        other => {
            return Err(WebhookError::Ignored(format!(
                "subscription status {other} needs no action"
            )));
        }
    };

    let mut canonical = SubscriptionEvent::new(Platform::Stripe, kind, subscription.id.clone());
    if kind.is_active() {
        let plan = subscription.plan().ok_or_else(|| {
            WebhookError::Ignored(format!("subscription {} has no known plan", subscription.id))
        })?;
        canonical.plan = Some(plan);
        canonical.purchased_at = timestamp(subscription.period_start());
        canonical.expires_at = timestamp(subscription.period_end());
        canonical.price_minor = subscription.price().and_then(|price| price.unit_amount);
    }

    Ok(CanonicalEvent::Subscription(canonical))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::payments::stripe_client::StripeEventData;

    fn event(type_: &str, livemode: bool, object: serde_json::Value) -> StripeEvent {
        StripeEvent {
            id: Some("evt_1".to_string()),
            type_: type_.to_string(),
            created: None,
            livemode: Some(livemode),
            data: StripeEventData { object },
        }
    }

    #[test]
    fn maps_payment_intent_succeeded() {
        let event = event(
            "payment_intent.succeeded",
            false,
            json!({"id": "pi_1", "amount": 5000, "amount_received": 5000}),
        );

        assert_eq!(
            decode_stripe_event(&event, Stage::Development).unwrap(),
            CanonicalEvent::PaymentSucceeded {
                provider_reference: "pi_1".to_string(),
                amount_minor: Some(5000),
            }
        );
    }

    #[test]
    fn ignores_test_events_in_production() {
        let event = event("payment_intent.succeeded", false, json!({"id": "pi_1"}));

        let err = decode_stripe_event(&event, Stage::Production).unwrap_err();
        assert_eq!(err.kind(), "ignored");
    }

    #[test]
    fn ignores_live_events_outside_production() {
        let event = event("customer.deleted", true, json!({"id": "cus_1"}));

        assert!(decode_stripe_event(&event, Stage::Local).is_err());
        assert_eq!(
            decode_stripe_event(&event, Stage::Production).unwrap(),
            CanonicalEvent::CustomerDeleted {
                customer_id: "cus_1".to_string()
            }
        );
    }

    #[test]
    fn refines_subscription_updates_by_status() {
        let active = event(
            "customer.subscription.updated",
            false,
            json!({
                "id": "sub_1",
                "status": "active",
                "items": {"data": [{
                    "current_period_start": 1_700_000_000,
                    "current_period_end": 1_702_592_000,
                    "price": {"id": "price_1", "lookup_key": "premium_monthly", "unit_amount": 999}
                }]}
            }),
        );
        let CanonicalEvent::Subscription(renewed) =
            decode_stripe_event(&active, Stage::Local).unwrap()
        else {
            panic!("expected subscription event");
        };
        assert_eq!(renewed.kind, SubscriptionEventKind::Renewed);
        assert_eq!(renewed.plan, Some(PlanName::Premium));
        assert_eq!(renewed.price_minor, Some(999));
        assert_eq!(renewed.expires_at, DateTime::from_timestamp(1_702_592_000, 0));

        let past_due = event(
            "customer.subscription.updated",
            false,
            json!({"id": "sub_1", "status": "past_due"}),
        );
        let CanonicalEvent::Subscription(failed) =
            decode_stripe_event(&past_due, Stage::Local).unwrap()
        else {
            panic!("expected subscription event");
        };
        assert_eq!(failed.kind, SubscriptionEventKind::FailedToRenew);

        let incomplete = event(
            "customer.subscription.updated",
            false,
            json!({"id": "sub_1", "status": "incomplete"}),
        );
        assert!(decode_stripe_event(&incomplete, Stage::Local).is_err());
    }

    #[test]
    fn unknown_event_types_are_ignored() {
        let event = event("invoice.created", false, json!({"id": "in_1"}));
        assert_eq!(
            decode_stripe_event(&event, Stage::Local).unwrap_err().kind(),
            "ignored"
        );
    }
}
