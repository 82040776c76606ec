use crate::domain::value_objects::fees::FeeSchedule;

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub account_webhook_secret: String,
    pub connected_accounts_webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct Apple {
    pub bundle_id: String,
}

#[derive(Debug, Clone)]
pub struct Google {
    pub package_name: String,
    pub service_account_email: String,
    pub service_account_private_key: String,
    pub token_uri: String,
}

#[derive(Debug, Clone)]
pub struct Notifications {
    pub gateway_url: Option<String>,
    pub gateway_api_key: Option<String>,
    pub queue_capacity: usize,
}

pub type Fees = FeeSchedule;
