use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;

use super::webhook_error::WebhookError;
use crate::domain::{
    repositories::payment_gateways::GoogleSubscriptionPurchase,
    value_objects::{
        canonical_events::{CanonicalEvent, SubscriptionEvent, SubscriptionEventKind},
        enums::{plan_names::PlanName, platforms::Platform},
    },
};

#[derive(Debug, Deserialize)]
struct PubSubPush {
    message: PubSubMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PubSubMessage {
    data: String,
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeveloperNotification {
    package_name: String,
    subscription_notification: Option<SubscriptionNotification>,
    test_notification: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionNotification {
    notification_type: i32,
    purchase_token: String,
    subscription_id: String,
}

/// What a Real-Time Developer Notification asks for. Active kinds still need the
/// billing period from the Play Developer API before they become canonical events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleNotice {
    Subscription(GoogleSubscriptionNotice),
    PendingPurchaseCanceled { purchase_token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleSubscriptionNotice {
    pub kind: SubscriptionEventKind,
    pub purchase_token: String,
    pub subscription_id: String,
    pub plan: Option<PlanName>,
}

impl GoogleSubscriptionNotice {
    pub fn needs_purchase_lookup(&self) -> bool {
        self.kind.is_active()
    }

    pub fn into_event(self, purchase: Option<GoogleSubscriptionPurchase>) -> CanonicalEvent {
        let mut event = SubscriptionEvent::new(Platform::Google, self.kind, self.purchase_token);
        event.plan = self.plan;
        if let Some(purchase) = purchase {
            event.purchased_at = purchase.started_at;
            event.expires_at = purchase.expires_at;
            event.price_minor = purchase.price_minor;
        }
        CanonicalEvent::Subscription(event)
    }
}

impl GoogleNotice {
    pub fn into_event(self) -> Option<CanonicalEvent> {
        match self {
            GoogleNotice::PendingPurchaseCanceled { purchase_token } => {
                Some(CanonicalEvent::PendingPurchaseCanceled {
                    platform: Platform::Google,
                    transaction_id: purchase_token,
                })
            }
            GoogleNotice::Subscription(notice) if !notice.needs_purchase_lookup() => {
                Some(notice.into_event(None))
            }
            GoogleNotice::Subscription(_) => None,
        }
    }
}

enum NoticeKind {
    Subscription(SubscriptionEventKind),
    PendingPurchaseCanceled,
}

fn notice_kind(notification_type: i32) -> Option<NoticeKind> {
    let kind = match notification_type {
        1 => SubscriptionEventKind::Recovered,
        2 => SubscriptionEventKind::Renewed,
        3 => SubscriptionEventKind::Cancelled,
        4 => SubscriptionEventKind::Purchased,
        // on hold, in grace period
        5 | 6 => SubscriptionEventKind::FailedToRenew,
        7 => SubscriptionEventKind::InteractiveRenewal,
        12 => SubscriptionEventKind::Revoked,
        13 => SubscriptionEventKind::Expired,
        20 => return Some(NoticeKind::PendingPurchaseCanceled),
        _ => return None,
    };
    Some(NoticeKind::Subscription(kind))
}

/// Decodes a Pub/Sub push body carrying a Real-Time Developer Notification.
pub fn decode_google_notification(
    body: &[u8],
    package_name: &str,
) -> Result<GoogleNotice, WebhookError> {
    let push: PubSubPush =
        serde_json::from_slice(body).map_err(|err| WebhookError::Malformed(err.to_string()))?;
    let data = STANDARD
        .decode(push.message.data.trim())
        .map_err(|err| WebhookError::Malformed(format!("message.data is not base64: {err}")))?;
    let notification: DeveloperNotification = serde_json::from_slice(&data)
        .map_err(|err| WebhookError::Malformed(format!("message.data: {err}")))?;

    if notification.test_notification.is_some() {
        return Err(WebhookError::Ignored(format!(
            "test notification {:?}",
            push.message.message_id
        )));
    }
    if notification.package_name != package_name {
        return Err(WebhookError::Ignored(format!(
            "package {} is not ours",
            notification.package_name
        )));
    }

    let subscription = notification
        .subscription_notification
        .ok_or_else(|| WebhookError::Ignored("not a subscription notification".into()))?;

    match notice_kind(subscription.notification_type) {
        Some(NoticeKind::PendingPurchaseCanceled) => Ok(GoogleNotice::PendingPurchaseCanceled {
            purchase_token: subscription.purchase_token,
        }),
        Some(NoticeKind::Subscription(kind)) => {
            let plan = PlanName::from_provider_sku(&subscription.subscription_id);
            if kind.is_active() && plan.is_none() {
                return Err(WebhookError::Ignored(format!(
                    "unknown subscription id {}",
                    subscription.subscription_id
                )));
            }
            Ok(GoogleNotice::Subscription(GoogleSubscriptionNotice {
                kind,
                purchase_token: subscription.purchase_token,
                subscription_id: subscription.subscription_id,
                plan,
            }))
        }
        None => Err(WebhookError::Ignored(format!(
            "notification type {} needs no action",
            subscription.notification_type
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn push(notification: Value) -> Vec<u8> {
        let data = STANDARD.encode(notification.to_string());
        serde_json::to_vec(&json!({"message": {"data": data, "messageId": "m-1"}})).unwrap()
    }

    fn subscription(notification_type: i32) -> Vec<u8> {
        push(json!({
            "version": "1.0",
            "packageName": "com.example.market",
            "eventTimeMillis": "1700000000000",
            "subscriptionNotification": {
                "version": "1.0",
                "notificationType": notification_type,
                "purchaseToken": "token-1",
                "subscriptionId": "basic_monthly",
            }
        }))
    }

    fn kind(notification_type: i32) -> Option<SubscriptionEventKind> {
        match decode_google_notification(&subscription(notification_type), "com.example.market") {
            Ok(GoogleNotice::Subscription(notice)) => Some(notice.kind),
            _ => None,
        }
    }

    #[test]
    fn maps_notification_types() {
        assert_eq!(kind(1), Some(SubscriptionEventKind::Recovered));
        assert_eq!(kind(2), Some(SubscriptionEventKind::Renewed));
        assert_eq!(kind(3), Some(SubscriptionEventKind::Cancelled));
        assert_eq!(kind(4), Some(SubscriptionEventKind::Purchased));
        assert_eq!(kind(5), Some(SubscriptionEventKind::FailedToRenew));
        assert_eq!(kind(6), Some(SubscriptionEventKind::FailedToRenew));
        assert_eq!(kind(7), Some(SubscriptionEventKind::InteractiveRenewal));
        assert_eq!(kind(12), Some(SubscriptionEventKind::Revoked));
        assert_eq!(kind(13), Some(SubscriptionEventKind::Expired));
        for ignored in [8, 9, 10, 11, 14, 19, 99] {
            assert_eq!(kind(ignored), None, "type {ignored}");
        }
    }

    #[test]
    fn maps_pending_purchase_cancellation() {
        let notice = decode_google_notification(&subscription(20), "com.example.market").unwrap();

        assert_eq!(
            notice.into_event(),
            Some(CanonicalEvent::PendingPurchaseCanceled {
                platform: Platform::Google,
                transaction_id: "token-1".to_string(),
            })
        );
    }

    #[test]
    fn active_kinds_wait_for_purchase_lookup() {
        let GoogleNotice::Subscription(notice) =
            decode_google_notification(&subscription(2), "com.example.market").unwrap()
        else {
            panic!("expected subscription notice");
        };
        assert!(notice.needs_purchase_lookup());
        assert_eq!(notice.plan, Some(PlanName::Basic));
        assert_eq!(GoogleNotice::Subscription(notice).into_event(), None);
    }

    #[test]
    fn ignores_test_and_foreign_notifications() {
        let test = push(json!({
            "version": "1.0",
            "packageName": "com.example.market",
            "testNotification": {"version": "1.0"}
        }));
        assert_eq!(
            decode_google_notification(&test, "com.example.market")
                .unwrap_err()
                .kind(),
            "ignored"
        );
        assert!(decode_google_notification(&subscription(2), "com.other.app").is_err());
        assert_eq!(
            decode_google_notification(b"{\"message\":{\"data\":\"***\"}}", "com.example.market")
                .unwrap_err()
                .kind(),
            "malformed"
        );
    }
}
