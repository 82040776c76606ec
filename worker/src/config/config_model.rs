use std::time::Duration;

use crates::config::{
    config_model::{Database, Notifications},
    stage::Stage,
};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub worker_server: WorkerServer,
    pub database: Database,
    pub stripe_secret_key: String,
    pub notifications: Notifications,
    pub sweeps: SweepSchedule,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
    pub db_pool_size: u32,
}

/// How often each sweep job ticks.
#[derive(Debug, Clone)]
pub struct SweepSchedule {
    /// Transient-order restoration, free-plan renewal and boost expiry.
    pub tick: Duration,
    pub expiry_warnings: Duration,
    pub broadcasts: Duration,
    pub admin_profit: Duration,
    pub transient_order_ttl: chrono::Duration,
}
