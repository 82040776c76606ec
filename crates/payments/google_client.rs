use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::{
    config::config_model::Google,
    domain::repositories::payment_gateways::{GooglePlayGateway, GoogleSubscriptionPurchase},
};

const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
const ANDROID_PUBLISHER_BASE: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Cached tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct ServiceAccountClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// `purchases.subscriptions` resource. Google encodes int64 fields as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPurchaseResource {
    order_id: Option<String>,
    start_time_millis: Option<String>,
    expiry_time_millis: Option<String>,
    price_amount_micros: Option<String>,
}

fn parse_millis(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| value.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

impl From<SubscriptionPurchaseResource> for GoogleSubscriptionPurchase {
    fn from(value: SubscriptionPurchaseResource) -> Self {
        Self {
            order_id: value.order_id,
            started_at: parse_millis(value.start_time_millis.as_deref()),
            expires_at: parse_millis(value.expiry_time_millis.as_deref()),
            price_minor: value
                .price_amount_micros
                .as_deref()
                .and_then(|micros| micros.parse::<i64>().ok())
                .map(|micros| micros / 10_000),
        }
    }
}

/// Google Play Developer API client authenticated with a service account.
pub struct GooglePlayClient {
    http: reqwest::Client,
    config: Google,
    token: Mutex<Option<CachedToken>>,
}

impl GooglePlayClient {
    pub fn new(config: Google) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now {
                return Ok(token.access_token.clone());
            }
        }

        let claims = ServiceAccountClaims {
            iss: &self.config.service_account_email,
            scope: ANDROID_PUBLISHER_SCOPE,
            aud: &self.config.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.config.service_account_private_key.as_bytes())
            .context("GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY is not a valid RSA key")?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let resp = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("google token request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(%status, body = %body, "google_client: token exchange failed");
            anyhow::bail!("google token exchange failed with status {status}");
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = now + Duration::seconds(token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS));
        debug!(%expires_at, "google_client: access token refreshed");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    pub async fn get_subscription_purchase(
        &self,
        subscription_id: &str,
        purchase_token: &str,
    ) -> Result<GoogleSubscriptionPurchase> {
        let access_token = self.access_token().await?;

        // https://developers.google.com/android-publisher/api-ref/rest/v3/purchases.subscriptions/get
        let resp = self
            .http
            .get(format!(
                "{}/applications/{}/purchases/subscriptions/{}/tokens/{}",
                ANDROID_PUBLISHER_BASE, self.config.package_name, subscription_id, purchase_token
            ))
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await
            .context("google subscription request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(
                %status,
                subscription_id,
                body = %body,
                "google_client: subscription lookup failed"
            );
            anyhow::bail!("google subscription lookup failed with status {status}");
        }

        let resource: SubscriptionPurchaseResource = resp.json().await?;
        Ok(resource.into())
    }
}

#[async_trait]
impl GooglePlayGateway for GooglePlayClient {
    async fn get_subscription(
        &self,
        subscription_id: &str,
        purchase_token: &str,
    ) -> Result<GoogleSubscriptionPurchase> {
        self.get_subscription_purchase(subscription_id, purchase_token)
            .await
    }
}
