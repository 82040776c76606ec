use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::repositories::{
    entitlement_store::EntitlementStore, payment_gateways::GooglePlayGateway,
};
use serde::Serialize;
use tracing::info;

use crate::usecases::payment_webhooks::{PaymentWebhookUseCase, StripeEndpoint, WebhookReceipt};

const STRIPE_SIGNATURE: &str = "stripe-signature";

/// Body of every webhook answer. Providers only look at the status code, which is
/// always 200 so they do not redeliver payloads we have already judged.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl WebhookResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&WebhookReceipt> for WebhookResponse {
    fn from(receipt: &WebhookReceipt) -> Self {
        Self {
            success: receipt.success(),
            message: receipt.message(),
            data: None,
        }
    }
}

pub fn routes<S, G>(usecase: Arc<PaymentWebhookUseCase<S, G>>) -> Router
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    Router::new()
        .route("/stripe-webhook-account", post(stripe_account::<S, G>))
        .route(
            "/stripe-webhook-connected-accounts",
            post(stripe_connected_accounts::<S, G>),
        )
        .route("/apple-webhook", post(apple::<S, G>))
        .route("/google-webhook", post(google::<S, G>))
        .with_state(usecase)
}

pub async fn stripe_account<S, G>(
    State(usecase): State<Arc<PaymentWebhookUseCase<S, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    let receipt = usecase
        .handle_stripe(StripeEndpoint::Account, &body, signature(&headers))
        .await;
    respond("stripe_account", receipt)
}

pub async fn stripe_connected_accounts<S, G>(
    State(usecase): State<Arc<PaymentWebhookUseCase<S, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    let receipt = usecase
        .handle_stripe(
            StripeEndpoint::ConnectedAccounts,
            &body,
            signature(&headers),
        )
        .await;
    respond("stripe_connected_accounts", receipt)
}

pub async fn apple<S, G>(
    State(usecase): State<Arc<PaymentWebhookUseCase<S, G>>>,
    body: Bytes,
) -> Response
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    let receipt = usecase.handle_apple(&body).await;
    respond("apple", receipt)
}

pub async fn google<S, G>(
    State(usecase): State<Arc<PaymentWebhookUseCase<S, G>>>,
    body: Bytes,
) -> Response
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized + 'static,
{
    let receipt = usecase.handle_google(&body).await;
    respond("google", receipt)
}

fn signature(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(STRIPE_SIGNATURE)
        .and_then(|value| value.to_str().ok())
}

fn respond(label: &str, receipt: WebhookReceipt) -> Response {
    info!(
        success = receipt.success(),
        receipt = ?receipt,
        "payment_webhooks: {} handled",
        label
    );
    (StatusCode::OK, Json(WebhookResponse::from(&receipt))).into_response()
}
