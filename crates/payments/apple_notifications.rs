use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, de::DeserializeOwned};

use super::webhook_error::WebhookError;
use crate::{
    config::stage::Stage,
    domain::value_objects::{
        canonical_events::{CanonicalEvent, SubscriptionEvent, SubscriptionEventKind},
        enums::{plan_names::PlanName, platforms::Platform},
    },
};

#[derive(Debug, Clone)]
pub struct AppleNotificationConfig {
    pub bundle_id: String,
    pub stage: Stage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppleWebhookBody {
    signed_payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleNotificationPayload {
    pub notification_type: String,
    pub subtype: Option<String>,
    pub notification_uuid: Option<String>,
    pub data: Option<AppleNotificationData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleNotificationData {
    pub bundle_id: Option<String>,
    pub environment: Option<String>,
    pub signed_transaction_info: Option<String>,
}

/// Decoded `JWSTransactionDecodedPayload`. Dates are epoch milliseconds and `price`
/// is in milli-units of the storefront currency.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleTransactionInfo {
    pub original_transaction_id: String,
    pub transaction_id: Option<String>,
    pub product_id: String,
    pub purchase_date: Option<i64>,
    pub expires_date: Option<i64>,
    pub price: Option<i64>,
}

/// Reads the claims of an App Store JWS without checking its x5c signature chain.
fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T, WebhookError> {
    let header =
        decode_header(token).map_err(|err| WebhookError::Malformed(format!("jws header: {err}")))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<T>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|err| WebhookError::Malformed(format!("jws payload: {err}")))
}

fn millis(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(DateTime::from_timestamp_millis)
}

fn expected_environment(stage: Stage) -> &'static str {
    if stage.is_production() {
        "Production"
    } else {
        "Sandbox"
    }
}

fn event_kind(notification_type: &str, subtype: Option<&str>) -> Option<SubscriptionEventKind> {
    match (notification_type, subtype) {
        ("SUBSCRIBED", Some("INITIAL_BUY")) => Some(SubscriptionEventKind::Purchased),
        ("SUBSCRIBED", Some("RESUBSCRIBE")) => Some(SubscriptionEventKind::InteractiveRenewal),
        ("DID_RENEW", Some("BILLING_RECOVERY")) => Some(SubscriptionEventKind::Recovered),
        ("DID_RENEW", _) => Some(SubscriptionEventKind::Renewed),
        ("DID_CHANGE_RENEWAL_STATUS", Some("AUTO_RENEW_DISABLED")) => {
            Some(SubscriptionEventKind::Cancelled)
        }
        ("DID_CHANGE_RENEWAL_PREF", _) => Some(SubscriptionEventKind::PlanChanged),
        ("REVOKE", _) => Some(SubscriptionEventKind::Revoked),
        ("EXPIRED", _) => Some(SubscriptionEventKind::Expired),
        ("REFUND", _) => Some(SubscriptionEventKind::Refunded),
        ("DID_FAIL_TO_RENEW", _) => Some(SubscriptionEventKind::FailedToRenew),
        _ => None,
    }
}

/// Translates an App Store Server Notification V2 body into a canonical event.
pub fn decode_apple_notification(
    body: &[u8],
    config: &AppleNotificationConfig,
) -> Result<CanonicalEvent, WebhookError> {
    let body: AppleWebhookBody =
        serde_json::from_slice(body).map_err(|err| WebhookError::Malformed(err.to_string()))?;
    let payload: AppleNotificationPayload = decode_unverified(&body.signed_payload)?;

    let kind = event_kind(&payload.notification_type, payload.subtype.as_deref()).ok_or_else(
        || {
            WebhookError::Ignored(format!(
                "apple notification {}/{} needs no action",
                payload.notification_type,
                payload.subtype.as_deref().unwrap_or("-")
            ))
        },
    )?;

    let data = payload
        .data
        .ok_or_else(|| WebhookError::Malformed("notification has no data".into()))?;

    if data.bundle_id.as_deref() != Some(config.bundle_id.as_str()) {
        return Err(WebhookError::Ignored(format!(
            "bundle id {:?} is not ours",
            data.bundle_id
        )));
    }
    let expected = expected_environment(config.stage);
    if data.environment.as_deref() != Some(expected) {
        return Err(WebhookError::Ignored(format!(
            "environment {:?} does not match {expected}",
            data.environment
        )));
    }

    let signed_transaction = data
        .signed_transaction_info
        .ok_or_else(|| WebhookError::Malformed("notification has no transaction".into()))?;
    let transaction: AppleTransactionInfo = decode_unverified(&signed_transaction)?;

    let mut event = SubscriptionEvent::new(
        Platform::Apple,
        kind,
        transaction.original_transaction_id.clone(),
    );

    if kind.is_active() || kind == SubscriptionEventKind::PlanChanged {
        let plan = PlanName::from_provider_sku(&transaction.product_id).ok_or_else(|| {
            WebhookError::Ignored(format!("unknown product id {}", transaction.product_id))
        })?;
        event.plan = Some(plan);
        event.purchased_at = millis(transaction.purchase_date);
        event.expires_at = millis(transaction.expires_date);
        event.price_minor = transaction.price.map(|milli_units| milli_units / 10);
    }

    Ok(CanonicalEvent::Subscription(event))
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};

    use super::*;

    /// Signs with a throwaway key; decoding never checks it.
    fn jws(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"not-apple"),
        )
        .unwrap()
    }

    fn notification_body(
        notification_type: &str,
        subtype: Option<&str>,
        environment: &str,
        transaction: Value,
    ) -> Vec<u8> {
        let payload = json!({
            "notificationType": notification_type,
            "subtype": subtype,
            "notificationUUID": "uuid-1",
            "data": {
                "bundleId": "com.example.market",
                "environment": environment,
                "signedTransactionInfo": jws(&transaction),
            }
        });
        serde_json::to_vec(&json!({ "signedPayload": jws(&payload) })).unwrap()
    }

    fn config(stage: Stage) -> AppleNotificationConfig {
        AppleNotificationConfig {
            bundle_id: "com.example.market".to_string(),
            stage,
        }
    }

    fn transaction() -> Value {
        json!({
            "originalTransactionId": "2000000111",
            "transactionId": "2000000222",
            "productId": "com.example.market.standard.monthly",
            "purchaseDate": 1_700_000_000_000_i64,
            "expiresDate": 1_702_592_000_000_i64,
            "price": 5990,
        })
    }

    #[test]
    fn maps_initial_buy_to_purchase() {
        let body = notification_body("SUBSCRIBED", Some("INITIAL_BUY"), "Sandbox", transaction());

        let CanonicalEvent::Subscription(event) =
            decode_apple_notification(&body, &config(Stage::Development)).unwrap()
        else {
            panic!("expected subscription event");
        };
        assert_eq!(event.kind, SubscriptionEventKind::Purchased);
        assert_eq!(event.transaction_id, "2000000111");
        assert_eq!(event.plan, Some(PlanName::Standard));
        assert_eq!(event.price_minor, Some(599));
        assert_eq!(
            event.expires_at,
            DateTime::from_timestamp_millis(1_702_592_000_000)
        );
    }

    #[test]
    fn maps_renewal_subtypes() {
        let recovered = notification_body("DID_RENEW", Some("BILLING_RECOVERY"), "Sandbox", transaction());
        let disabled = notification_body(
            "DID_CHANGE_RENEWAL_STATUS",
            Some("AUTO_RENEW_DISABLED"),
            "Sandbox",
            transaction(),
        );
        let enabled = notification_body(
            "DID_CHANGE_RENEWAL_STATUS",
            Some("AUTO_RENEW_ENABLED"),
            "Sandbox",
            transaction(),
        );

        let kind = |body: &[u8]| match decode_apple_notification(body, &config(Stage::Local)) {
            Ok(CanonicalEvent::Subscription(event)) => Some(event.kind),
            _ => None,
        };
        assert_eq!(kind(&recovered), Some(SubscriptionEventKind::Recovered));
        assert_eq!(kind(&disabled), Some(SubscriptionEventKind::Cancelled));
        assert_eq!(kind(&enabled), None);
    }

    #[test]
    fn ignores_other_environments_and_bundles() {
        let sandbox = notification_body("EXPIRED", None, "Sandbox", transaction());
        assert_eq!(
            decode_apple_notification(&sandbox, &config(Stage::Production))
                .unwrap_err()
                .kind(),
            "ignored"
        );

        let other_bundle = AppleNotificationConfig {
            bundle_id: "com.other.app".to_string(),
            stage: Stage::Local,
        };
        assert!(decode_apple_notification(&sandbox, &other_bundle).is_err());
    }

    #[test]
    fn rejects_malformed_bodies() {
        let err = decode_apple_notification(b"{\"signedPayload\":\"abc\"}", &config(Stage::Local))
            .unwrap_err();
        assert_eq!(err.kind(), "malformed");
        assert!(decode_apple_notification(b"not json", &config(Stage::Local)).is_err());
    }
}
