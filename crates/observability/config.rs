use std::env;

use tracing::Level;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct DiscordConfig {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) discord: Option<DiscordConfig>,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();
        let service_name = non_empty_var("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = non_empty_var("STAGE").unwrap_or_else(|| "unknown".to_string());

        let mut warnings = Vec::new();
        let discord = discord_from_env(&mut warnings);

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            discord,
            warnings,
        }
    }
}

fn discord_from_env(warnings: &mut Vec<String>) -> Option<DiscordConfig> {
    if !parse_bool(non_empty_var("DISCORD_NOTIFY_ENABLED").as_deref()).unwrap_or(true) {
        return None;
    }

    let raw_url = non_empty_var("DISCORD_WEBHOOK_URL")?;
    let webhook_url = match Url::parse(&raw_url) {
        Ok(url) => url,
        Err(err) => {
            // The URL embeds the webhook token; only the parse error is reported.
            warnings.push(format!(
                "DISCORD_WEBHOOK_URL is invalid; alerts disabled (parse error: {err})"
            ));
            return None;
        }
    };

    let min_level = match non_empty_var("DISCORD_NOTIFY_LEVEL") {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            warnings.push(format!(
                "DISCORD_NOTIFY_LEVEL is invalid (value: {raw}); defaulting to ERROR"
            ));
            Level::ERROR
        }),
        None => Level::ERROR,
    };

    Some(DiscordConfig {
        webhook_url,
        min_level,
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

pub(crate) fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
