use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use url::Url;

use super::alert_queue::{AlertEvent, AlertSink};

const DISCORD_CONTENT_LIMIT: usize = 2000;
const TRUNCATION_SUFFIX: &str = "\n… (truncated)";

pub(crate) struct DiscordAlertSink {
    webhook_url: Url,
    client: Client,
}

impl DiscordAlertSink {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

pub(crate) fn format_content(event: &AlertEvent) -> String {
    let mut lines = vec![
        format!(
            "**{}** `{}` `{}` `{}`",
            event.service_name,
            event.environment,
            event.component,
            event.level.as_str()
        ),
        format!(
            "`{}` `{}`{}",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event.target,
            event
                .location
                .as_ref()
                .map(|location| format!(" `{location}`"))
                .unwrap_or_default()
        ),
    ];

    if let Some(message) = event.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        lines.push(format!("> {message}"));
    }

    if !event.spans.is_empty() {
        let chain = event
            .spans
            .iter()
            .map(|span| span.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ");
        lines.push(format!("spans: `{chain}`"));
    }

    if !event.fields.is_empty() {
        lines.push("fields:".to_string());
        lines.extend(event.fields.iter().map(|(k, v)| format!("- `{k}` = `{v}`")));
    }

    for span in event.spans.iter().filter(|span| !span.fields.is_empty()) {
        lines.push(format!("span `{}`:", span.name));
        lines.extend(span.fields.iter().map(|(k, v)| format!("- `{k}` = `{v}`")));
    }

    truncate(lines.join("\n"))
}

fn truncate(content: String) -> String {
    if content.chars().count() <= DISCORD_CONTENT_LIMIT {
        return content;
    }

    let allowed = DISCORD_CONTENT_LIMIT - TRUNCATION_SUFFIX.chars().count();
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

#[async_trait]
impl AlertSink for DiscordAlertSink {
    async fn deliver(&self, event: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": format_content(event) }))
            .send()
            .await
            // reqwest errors embed the URL, which carries the webhook token.
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("discord webhook request timed out")
                } else if err.is_connect() {
                    anyhow!("discord webhook connection failed")
                } else {
                    anyhow!("discord webhook request failed")
                }
            })?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "discord webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}
