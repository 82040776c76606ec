use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::domain::{
    entities::notifications::PushMessage, repositories::notification_gateway::NotificationGateway,
};

/// Producer side of the push-notification queue. `enqueue` never blocks and drops the
/// message when the queue is full; `deliver` waits for room instead.
#[derive(Debug, Clone)]
pub struct NotificationOutbox {
    tx: mpsc::Sender<PushMessage>,
}

impl NotificationOutbox {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PushMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, message: PushMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                warn!(
                    receiver_id = %message.receiver_id,
                    title = %message.title,
                    "outbox: queue full; dropping push message"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                warn!(
                    receiver_id = %message.receiver_id,
                    title = %message.title,
                    "outbox: worker stopped; dropping push message"
                );
                false
            }
        }
    }

    /// Waits for queue capacity. Fails only once the worker has stopped.
    pub async fn deliver(&self, message: PushMessage) -> Result<()> {
        self.tx.send(message).await.map_err(|err| {
            anyhow!(
                "outbox worker stopped; message to {} not queued",
                err.0.receiver_id
            )
        })
    }

    pub fn enqueue_all(&self, messages: impl IntoIterator<Item = PushMessage>) -> usize {
        messages
            .into_iter()
            .filter(|message| self.enqueue(message.clone()))
            .count()
    }
}

/// Drains the queue into the gateway until every sender is dropped. Delivery errors are
/// logged and discarded.
pub fn spawn_outbox_worker(
    mut rx: mpsc::Receiver<PushMessage>,
    gateway: Arc<dyn NotificationGateway>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("outbox: worker started");

        while let Some(message) = rx.recv().await {
            match gateway.send_single_user(&message).await {
                Ok(()) => debug!(receiver_id = %message.receiver_id, "outbox: delivered"),
                Err(err) => warn!(
                    receiver_id = %message.receiver_id,
                    title = %message.title,
                    error = ?err,
                    "outbox: delivery failed; message discarded"
                ),
            }
        }

        info!("outbox: worker stopped");
    })
}
