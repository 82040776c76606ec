mod alert_queue;
mod config;
mod discord;
mod layer;

use std::sync::Arc;

use alert_queue::AlertQueue;
use anyhow::Result;
use config::ObservabilityConfig;
use discord::DiscordAlertSink;
use layer::AlertLayer;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber for a binary. Must run inside a tokio runtime
/// because the alert queue spawns its drain task.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.discord.as_ref() {
        Some(discord) => {
            let sink = DiscordAlertSink::new(discord.webhook_url.clone())?;
            let queue = AlertQueue::spawn(vec![Arc::new(sink)]);
            Some(
                AlertLayer::new(queue, config.service_context.clone())
                    .with_filter(LevelFilter::from_level(discord.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local offset so `TZ` is honoured in log timestamps.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    let context = &config.service_context;
    for warning in &config.warnings {
        warn!(
            service = %context.service_name,
            environment = %context.environment,
            component = %context.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        alerts_enabled = config.discord.is_some(),
        "observability: initialized"
    );

    Ok(())
}
