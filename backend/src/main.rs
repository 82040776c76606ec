use anyhow::Result;
use backend::{
    axum_http::http_serve,
    config::config_loader,
    usecases::payment_webhooks::{PaymentWebhookConfig, PaymentWebhookUseCase},
};
use crates::{
    infra::db::{
        postgres::postgres_connection, repositories::entitlement_store::PgEntitlementStore,
    },
    notifications::{
        outbox::{NotificationOutbox, spawn_outbox_worker},
        push_gateway::build_notification_gateway,
    },
    payments::{
        apple_notifications::AppleNotificationConfig, google_client::GooglePlayClient,
    },
    usecases::reconciliation::ReconciliationEngine,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = Arc::new(config_loader::load()?);
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.backend_server.db_pool_size,
    )?;
    info!("Postgres connection has been established");

    let store = Arc::new(PgEntitlementStore::new(Arc::new(postgres_pool)));

    let (outbox, outbox_rx) = NotificationOutbox::new(dotenvy_env.notifications.queue_capacity);
    let notification_gateway = build_notification_gateway(&dotenvy_env.notifications)?;
    let outbox_worker = spawn_outbox_worker(outbox_rx, notification_gateway);

    let engine = Arc::new(ReconciliationEngine::new(
        store,
        dotenvy_env.fees,
        outbox,
    ));
    let google_play = Arc::new(GooglePlayClient::new(dotenvy_env.google.clone()));

    let webhook_usecase = Arc::new(PaymentWebhookUseCase::new(
        engine,
        google_play,
        PaymentWebhookConfig {
            stage: dotenvy_env.stage,
            stripe_account_secret: dotenvy_env.stripe.account_webhook_secret.clone(),
            stripe_connected_accounts_secret: dotenvy_env
                .stripe
                .connected_accounts_webhook_secret
                .clone(),
            apple: AppleNotificationConfig {
                bundle_id: dotenvy_env.apple.bundle_id.clone(),
                stage: dotenvy_env.stage,
            },
            google_package_name: dotenvy_env.google.package_name.clone(),
        },
    ));

    let server = tokio::spawn(http_serve::start(Arc::clone(&dotenvy_env), webhook_usecase));

    tokio::select! {
        result = server => result??,
        result = outbox_worker => {
            result?;
            anyhow::bail!("notification outbox worker stopped");
        }
    };

    Ok(())
}
