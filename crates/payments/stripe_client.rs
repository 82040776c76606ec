use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

use super::webhook_error::WebhookError;
use crate::domain::repositories::payment_gateways::{Settlement, StripeGateway};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpandedPaymentIntent {
    id: String,
    latest_charge: Option<ExpandedCharge>,
}

#[derive(Debug, Deserialize)]
struct ExpandedCharge {
    balance_transaction: Option<BalanceTransaction>,
}

#[derive(Debug, Deserialize)]
struct BalanceTransaction {
    amount: i64,
    fee: i64,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.clone()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.clone()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.clone()),
            context,
            "stripe_client: request failed"
        );

        anyhow::bail!("stripe {context} failed with status {status}")
    }

    /// Realized amount and fee of a payment intent, read from the balance transaction of
    /// its latest charge.
    pub async fn retrieve_settlement(&self, payment_intent_id: &str) -> Result<Settlement> {
        // https://stripe.com/docs/api/balance_transactions/object
        let resp = self
            .http
            .get(format!("{}/payment_intents/{}", self.api_base, payment_intent_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .query(&[("expand[]", "latest_charge.balance_transaction")])
            .send()
            .await
            .context("stripe payment intent request failed")?;
        let resp = Self::ensure_success(resp, "retrieve payment intent").await?;

        let intent: ExpandedPaymentIntent = resp.json().await?;
        let balance = intent
            .latest_charge
            .and_then(|charge| charge.balance_transaction)
            .with_context(|| format!("payment intent {} has no balance transaction", intent.id))?;

        Ok(Settlement {
            amount_minor: balance.amount,
            fee_minor: balance.fee,
        })
    }
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn fetch_settlement(&self, payment_intent_id: &str) -> Result<Settlement> {
        self.retrieve_settlement(payment_intent_id).await
    }
}

/// Verifies a `stripe-signature` header (`t=<unix>,v1=<hex>[,v1=...]`) against the
/// endpoint secret and decodes the event. https://stripe.com/docs/webhooks/signatures
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    webhook_secret: &str,
    now: DateTime<Utc>,
) -> Result<StripeEvent, WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',').map(str::trim) {
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = rest.parse().ok();
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signatures.push(rest);
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| WebhookError::Verification("missing timestamp in stripe-signature".into()))?;
    if signatures.is_empty() {
        return Err(WebhookError::Verification(
            "missing v1 in stripe-signature".into(),
        ));
    }
    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::Verification(
            "stripe-signature timestamp outside tolerance".into(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .map_err(|err| WebhookError::Verification(format!("invalid webhook secret: {err}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|provided| mac.clone().verify_slice(&provided).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(WebhookError::Verification("invalid webhook signature".into()));
    }

    serde_json::from_slice(payload).map_err(|err| WebhookError::Malformed(err.to_string()))
}

/// Builds a `stripe-signature` header for `payload`, as Stripe would for replayed events.
pub fn sign_webhook_payload(payload: &[u8], webhook_secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn payload() -> &'static [u8] {
        br#"{"id":"evt_1","type":"payment_intent.succeeded","livemode":false,"data":{"object":{"id":"pi_1","amount_received":1000}}}"#
    }

    #[test]
    fn accepts_a_valid_signature() {
        let now = Utc::now();
        let header = sign_webhook_payload(payload(), SECRET, now.timestamp()).unwrap();

        let event = verify_webhook_signature(payload(), &header, SECRET, now).unwrap();
        assert_eq!(event.type_, "payment_intent.succeeded");
        assert_eq!(event.livemode, Some(false));
    }

    #[test]
    fn rejects_a_signature_from_another_secret() {
        let now = Utc::now();
        let header = sign_webhook_payload(payload(), "whsec_other", now.timestamp()).unwrap();

        let err = verify_webhook_signature(payload(), &header, SECRET, now).unwrap_err();
        assert_eq!(err.kind(), "verification");
    }

    #[test]
    fn rejects_stale_timestamps_and_missing_parts() {
        let now = Utc::now();
        let stale = sign_webhook_payload(payload(), SECRET, now.timestamp() - 301).unwrap();

        assert!(verify_webhook_signature(payload(), &stale, SECRET, now).is_err());
        assert!(verify_webhook_signature(payload(), "v1=abcd", SECRET, now).is_err());
        assert!(verify_webhook_signature(payload(), "t=1", SECRET, now).is_err());
    }
}
