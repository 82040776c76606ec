use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{Level, warn};

const ALERT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub(crate) struct SpanSummary {
    pub(crate) name: String,
    pub(crate) fields: BTreeMap<String, String>,
}

/// A log event captured for delivery to an alert sink. Field values are already redacted.
#[derive(Debug, Clone)]
pub(crate) struct AlertEvent {
    pub(crate) level: Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) target: String,
    pub(crate) location: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<SpanSummary>,
}

#[async_trait]
pub(crate) trait AlertSink: Send + Sync {
    async fn deliver(&self, event: &AlertEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Bounded hand-off between the tracing layer and the sinks. Never blocks the
/// logging call site; events are dropped when the queue is full.
#[derive(Clone)]
pub(crate) struct AlertQueue {
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertQueue {
    pub(crate) fn spawn(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertEvent>(ALERT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for sink in &sinks {
                    if let Err(error) = sink.deliver(&event).await {
                        warn!(sink = sink.name(), error = %error, "observability: alert delivery failed");
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn push(&self, event: AlertEvent) {
        if let Err(err) = self.tx.try_send(event) {
            match err {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("observability: alert queue full; dropping event")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!("observability: alert queue closed; dropping event")
                }
            }
        }
    }
}
