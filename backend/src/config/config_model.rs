use crates::config::{
    config_model::{Apple, Database, Fees, Google, Notifications, Stripe},
    stage::Stage,
};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub stripe: Stripe,
    pub apple: Apple,
    pub google: Google,
    pub fees: Fees,
    pub notifications: Notifications,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
    pub db_pool_size: u32,
}
