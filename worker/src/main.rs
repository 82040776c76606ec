use anyhow::Result;
use crates::{
    infra::db::{
        postgres::postgres_connection, repositories::entitlement_store::PgEntitlementStore,
    },
    notifications::{
        outbox::{NotificationOutbox, spawn_outbox_worker},
        push_gateway::build_notification_gateway,
    },
    payments::stripe_client::StripeClient,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};
use worker::{axum_http, config, scheduler::Sweeps};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = config::config_loader::load()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.worker_server.db_pool_size,
    )?;
    info!("Postgres connection has been established");

    let store = Arc::new(PgEntitlementStore::new(Arc::new(postgres_pool)));

    let (outbox, outbox_rx) = NotificationOutbox::new(dotenvy_env.notifications.queue_capacity);
    let notification_gateway = build_notification_gateway(&dotenvy_env.notifications)?;
    let outbox_worker = spawn_outbox_worker(outbox_rx, notification_gateway);

    let stripe = Arc::new(StripeClient::new(dotenvy_env.stripe_secret_key.clone()));
    let sweeps = Arc::new(Sweeps::new(store, stripe, outbox, &dotenvy_env.sweeps));

    let mut sweep_loops = JoinSet::new();
    sweeps.spawn(&dotenvy_env.sweeps, &mut sweep_loops);
    info!(jobs = sweep_loops.len(), "Sweep jobs have been scheduled");

    let health_server = tokio::spawn(axum_http::http_serve::start(
        dotenvy_env.worker_server.clone(),
    ));

    tokio::select! {
        result = health_server => result??,
        Some(result) = sweep_loops.join_next() => result??,
        result = outbox_worker => {
            result?;
            anyhow::bail!("notification outbox worker stopped");
        }
    };

    Ok(())
}
