use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::{
    config::config_model::Notifications,
    domain::{
        entities::notifications::PushMessage,
        repositories::notification_gateway::NotificationGateway,
    },
};

/// Posts push messages as JSON to the notification service.
pub struct HttpNotificationGateway {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpNotificationGateway {
    pub fn new(url: String, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, url, api_key })
    }
}

#[async_trait]
impl NotificationGateway for HttpNotificationGateway {
    async fn send_single_user(&self, message: &PushMessage) -> Result<()> {
        let mut request = self.http.post(&self.url).json(message);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let resp = request
            .send()
            .await
            .context("notification gateway request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!(
                "notification gateway returned non-success status: {}",
                resp.status()
            );
        }

        Ok(())
    }
}

/// Used when no gateway is configured, e.g. on a developer machine.
pub struct LoggingNotificationGateway;

#[async_trait]
impl NotificationGateway for LoggingNotificationGateway {
    async fn send_single_user(&self, message: &PushMessage) -> Result<()> {
        info!(
            receiver_id = %message.receiver_id,
            title = %message.title,
            devices = message.tokens.len(),
            "push_gateway: no gateway configured; message logged only"
        );
        Ok(())
    }
}

pub fn build_notification_gateway(config: &Notifications) -> Result<Arc<dyn NotificationGateway>> {
    match &config.gateway_url {
        Some(url) => Ok(Arc::new(HttpNotificationGateway::new(
            url.clone(),
            config.gateway_api_key.clone(),
        )?)),
        None => Ok(Arc::new(LoggingNotificationGateway)),
    }
}
