use anyhow::{Context, Result};
use crates::config::config_loader as shared;

use super::config_model::{BackendServer, DotEnvyConfig};

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .context("SERVER_PORT_BACKEND is invalid")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: var_or("SERVER_BODY_LIMIT", "1")
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: var_or("SERVER_TIMEOUT", "30")
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
        db_pool_size: var_or("DATABASE_POOL_SIZE", "10")
            .parse()
            .context("DATABASE_POOL_SIZE is invalid")?,
    };

    Ok(DotEnvyConfig {
        stage: shared::get_stage(),
        backend_server,
        database: shared::load_database()?,
        stripe: shared::load_stripe()?,
        apple: shared::load_apple()?,
        google: shared::load_google()?,
        fees: shared::load_fees()?,
        notifications: shared::load_notifications()?,
    })
}
