use std::time::Duration;

use anyhow::{Context, Result};
use crates::{
    config::config_loader as shared,
    usecases::sweeps::transient_orders::DEFAULT_TRANSIENT_ORDER_TTL_MINUTES,
};

use super::config_model::{DotEnvyConfig, SweepSchedule, WorkerServer};

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn seconds(name: &str, default: u64) -> Result<Duration> {
    let secs: u64 = var_or(name, &default.to_string())
        .parse()
        .with_context(|| format!("{name} is invalid"))?;
    anyhow::ensure!(secs > 0, "{name} must be positive");
    Ok(Duration::from_secs(secs))
}

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .context("SERVER_PORT_WORKER is invalid")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
        body_limit: var_or("SERVER_BODY_LIMIT", "1")
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: var_or("SERVER_TIMEOUT", "30")
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
        db_pool_size: var_or("DATABASE_POOL_SIZE", "5")
            .parse()
            .context("DATABASE_POOL_SIZE is invalid")?,
    };

    let ttl_minutes: i64 = var_or(
        "TRANSIENT_ORDER_TTL_MINUTES",
        &DEFAULT_TRANSIENT_ORDER_TTL_MINUTES.to_string(),
    )
    .parse()
    .context("TRANSIENT_ORDER_TTL_MINUTES is invalid")?;

    let sweeps = SweepSchedule {
        tick: seconds("SWEEP_TICK_SECONDS", 60)?,
        expiry_warnings: seconds("EXPIRY_WARNING_INTERVAL_SECONDS", 15 * 60)?,
        broadcasts: seconds("BROADCAST_INTERVAL_SECONDS", 30)?,
        admin_profit: seconds("ADMIN_PROFIT_INTERVAL_SECONDS", 10 * 60)?,
        transient_order_ttl: chrono::Duration::minutes(ttl_minutes),
    };

    Ok(DotEnvyConfig {
        stage: shared::get_stage(),
        worker_server,
        database: shared::load_database()?,
        stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
            .context("STRIPE_SECRET_KEY is invalid")?,
        notifications: shared::load_notifications()?,
        sweeps,
    })
}
