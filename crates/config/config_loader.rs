use anyhow::{Context, Result};

use super::{
    config_model::{Apple, Database, Fees, Google, Notifications, Stripe},
    stage::Stage,
};
use crate::domain::value_objects::fees::{decimal_to_minor, fraction_to_bps};

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} is invalid"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

pub fn load_database() -> Result<Database> {
    dotenvy::dotenv().ok();

    Ok(Database {
        url: required("DATABASE_URL")?,
    })
}

pub fn load_stripe() -> Result<Stripe> {
    dotenvy::dotenv().ok();

    Ok(Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        account_webhook_secret: required("STRIPE_WEBHOOK_SECRET_ACCOUNT")?,
        connected_accounts_webhook_secret: required("STRIPE_WEBHOOK_SECRET_CONNECTED_ACCOUNTS")?,
    })
}

pub fn load_apple() -> Result<Apple> {
    dotenvy::dotenv().ok();

    Ok(Apple {
        bundle_id: required("APPLE_BUNDLE_ID")?,
    })
}

pub fn load_google() -> Result<Google> {
    dotenvy::dotenv().ok();

    Ok(Google {
        package_name: required("GOOGLE_PACKAGE_NAME")?,
        service_account_email: required("GOOGLE_SERVICE_ACCOUNT_EMAIL")?,
        // Keys pasted into .env usually carry escaped newlines.
        service_account_private_key: required("GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY")?
            .replace("\\n", "\n"),
        token_uri: optional("GOOGLE_TOKEN_URI")
            .unwrap_or_else(|| "https://oauth2.googleapis.com/token".to_string()),
    })
}

pub fn load_fees() -> Result<Fees> {
    dotenvy::dotenv().ok();

    Ok(Fees {
        platform_fee_bps: fraction_to_bps(
            &optional("PLATFORM_FEE").unwrap_or_else(|| "0.1".to_string()),
        )
        .context("PLATFORM_FEE is invalid")?,
        provider_fee_bps: fraction_to_bps(
            &optional("STRIPE_FEE_PERCENTAGE").unwrap_or_else(|| "0.029".to_string()),
        )
        .context("STRIPE_FEE_PERCENTAGE is invalid")?,
        provider_fixed_fee_minor: decimal_to_minor(
            &optional("STRIPE_FIXED_FEE").unwrap_or_else(|| "0.30".to_string()),
        )
        .context("STRIPE_FIXED_FEE is invalid")?,
    })
}

pub fn load_notifications() -> Result<Notifications> {
    dotenvy::dotenv().ok();

    Ok(Notifications {
        gateway_url: optional("NOTIFICATION_GATEWAY_URL"),
        gateway_api_key: optional("NOTIFICATION_GATEWAY_API_KEY"),
        queue_capacity: optional("NOTIFICATION_QUEUE_CAPACITY")
            .unwrap_or_else(|| "256".to_string())
            .parse()
            .context("NOTIFICATION_QUEUE_CAPACITY is invalid")?,
    })
}
