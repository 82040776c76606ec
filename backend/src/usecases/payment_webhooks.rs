use std::sync::Arc;

use chrono::Utc;
use crates::{
    config::stage::Stage,
    domain::{
        repositories::{entitlement_store::EntitlementStore, payment_gateways::GooglePlayGateway},
        value_objects::canonical_events::CanonicalEvent,
    },
    payments::{
        apple_notifications::{AppleNotificationConfig, decode_apple_notification},
        google_notifications::{GoogleNotice, decode_google_notification},
        stripe_client::verify_webhook_signature,
        stripe_events::decode_stripe_event,
        webhook_error::WebhookError,
    },
    usecases::reconciliation::{Effect, Outcome, ReconciliationEngine, SkipReason},
};
use tracing::{error, info, warn};

/// Stripe signs each webhook endpoint with its own secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEndpoint {
    Account,
    ConnectedAccounts,
}

#[derive(Debug, Clone)]
pub struct PaymentWebhookConfig {
    pub stage: Stage,
    pub stripe_account_secret: String,
    pub stripe_connected_accounts_secret: String,
    pub apple: AppleNotificationConfig,
    pub google_package_name: String,
}

/// What became of one inbound webhook. Every variant is answered with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReceipt {
    Applied(Effect),
    Skipped(SkipReason),
    Rejected(WebhookError),
    Failed(String),
}

impl WebhookReceipt {
    /// False only when the payload could not be trusted or the change was rolled back.
    pub fn success(&self) -> bool {
        match self {
            WebhookReceipt::Applied(_) | WebhookReceipt::Skipped(_) => true,
            WebhookReceipt::Rejected(err) => matches!(err, WebhookError::Ignored(_)),
            WebhookReceipt::Failed(_) => false,
        }
    }

    pub fn message(&self) -> String {
        match self {
            WebhookReceipt::Applied(effect) => format!("applied: {effect:?}"),
            WebhookReceipt::Skipped(reason) => format!("skipped: {reason:?}"),
            WebhookReceipt::Rejected(err) => err.to_string(),
            WebhookReceipt::Failed(reason) => format!("not applied: {reason}"),
        }
    }
}

pub struct PaymentWebhookUseCase<S, G>
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized,
{
    engine: Arc<ReconciliationEngine<S>>,
    google_play: Arc<G>,
    config: PaymentWebhookConfig,
}

impl<S, G> PaymentWebhookUseCase<S, G>
where
    S: EntitlementStore,
    G: GooglePlayGateway + ?Sized,
{
    pub fn new(
        engine: Arc<ReconciliationEngine<S>>,
        google_play: Arc<G>,
        config: PaymentWebhookConfig,
    ) -> Self {
        Self {
            engine,
            google_play,
            config,
        }
    }

    pub async fn handle_stripe(
        &self,
        endpoint: StripeEndpoint,
        payload: &[u8],
        signature: Option<&str>,
    ) -> WebhookReceipt {
        let secret = match endpoint {
            StripeEndpoint::Account => &self.config.stripe_account_secret,
            StripeEndpoint::ConnectedAccounts => &self.config.stripe_connected_accounts_secret,
        };
        let Some(signature) = signature else {
            return rejected(
                "stripe",
                WebhookError::Verification("missing stripe-signature header".into()),
            );
        };

        let event = match verify_webhook_signature(payload, signature, secret, Utc::now()) {
            Ok(event) => event,
            Err(err) => return rejected("stripe", err),
        };
        info!(
            event_id = ?event.id,
            event_type = %event.type_,
            endpoint = ?endpoint,
            "payment_webhooks: stripe event received"
        );

        match decode_stripe_event(&event, self.config.stage) {
            Ok(canonical) => self.apply("stripe", canonical).await,
            Err(err) => rejected("stripe", err),
        }
    }

    pub async fn handle_apple(&self, body: &[u8]) -> WebhookReceipt {
        match decode_apple_notification(body, &self.config.apple) {
            Ok(canonical) => self.apply("apple", canonical).await,
            Err(err) => rejected("apple", err),
        }
    }

    pub async fn handle_google(&self, body: &[u8]) -> WebhookReceipt {
        let notice = match decode_google_notification(body, &self.config.google_package_name) {
            Ok(notice) => notice,
            Err(err) => return rejected("google", err),
        };

        let canonical = match notice {
            GoogleNotice::Subscription(notice) if notice.needs_purchase_lookup() => {
                // Play API call happens before, never inside, the store transaction.
                match self
                    .google_play
                    .get_subscription(&notice.subscription_id, &notice.purchase_token)
                    .await
                {
                    Ok(purchase) => notice.into_event(Some(purchase)),
                    Err(err) => {
                        error!(
                            subscription_id = %notice.subscription_id,
                            error = ?err,
                            "payment_webhooks: google purchase lookup failed"
                        );
                        return WebhookReceipt::Failed(format!("purchase lookup failed: {err}"));
                    }
                }
            }
            other => match other.into_event() {
                Some(canonical) => canonical,
                None => {
                    return rejected(
                        "google",
                        WebhookError::Ignored("notification needs no action".into()),
                    );
                }
            },
        };

        self.apply("google", canonical).await
    }

    async fn apply(&self, provider: &'static str, canonical: CanonicalEvent) -> WebhookReceipt {
        // The engine logs the outcome and any rollback itself.
        match self.engine.apply(canonical).await {
            Ok(Outcome::Applied(effect)) => WebhookReceipt::Applied(effect),
            Ok(Outcome::Skipped(reason)) => WebhookReceipt::Skipped(reason),
            Err(err) => {
                info!(provider, "payment_webhooks: event not applied");
                WebhookReceipt::Failed(err.to_string())
            }
        }
    }
}

fn rejected(provider: &'static str, err: WebhookError) -> WebhookReceipt {
    match &err {
        WebhookError::Ignored(reason) => {
            info!(provider, reason = %reason, "payment_webhooks: ignored")
        }
        WebhookError::Verification(reason) | WebhookError::Malformed(reason) => warn!(
            provider,
            kind = err.kind(),
            reason = %reason,
            "payment_webhooks: rejected"
        ),
    }
    WebhookReceipt::Rejected(err)
}
