use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info};

use super::{BATCH_LIMIT, SweepReport};
use crate::{
    domain::{entities::notifications::PushMessage, repositories::entitlement_store::EntitlementStore},
    notifications::outbox::NotificationOutbox,
};

/// Fans due scheduled admin notifications out to every client and stamps them sent.
pub struct ScheduledBroadcastsUseCase<S>
where
    S: EntitlementStore,
{
    store: Arc<S>,
    outbox: NotificationOutbox,
}

impl<S> ScheduledBroadcastsUseCase<S>
where
    S: EntitlementStore,
{
    pub fn new(store: Arc<S>, outbox: NotificationOutbox) -> Self {
        Self { store, outbox }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due = self.store.list_due_broadcasts(now, BATCH_LIMIT).await?;
        let mut report = SweepReport::scanned(due.len());
        if due.is_empty() {
            return Ok(report);
        }

        let recipients = self.store.list_client_recipients().await?;

        for notification in due {
            // Stamped only after every recipient's message is queued; otherwise it stays due.
            for recipient in &recipients {
                let message = PushMessage {
                    sender_id: Some(notification.sender_id),
                    ..PushMessage::to_user(
                        recipient.user_id,
                        recipient.device_tokens.clone(),
                        &notification.title,
                        notification.body.clone(),
                    )
                    .with_data("type", "admin_broadcast")
                    .with_data("notification_id", notification.id.to_string())
                };
                self.outbox.deliver(message).await.with_context(|| {
                    format!("scheduled broadcast {} not fully queued", notification.id)
                })?;
            }

            match self.store.mark_broadcast_sent(notification.id, now).await {
                Ok(()) => {
                    info!(
                        notification_id = %notification.id,
                        recipients = recipients.len(),
                        "scheduled_broadcasts: sent"
                    );
                    report.applied += 1;
                }
                Err(err) => {
                    error!(
                        notification_id = %notification.id,
                        error = ?err,
                        "scheduled_broadcasts: failed to stamp sent_date"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::notifications::AdminNotification,
            value_objects::enums::{notification_kinds::NotificationKind, user_roles::UserRole},
        },
        usecases::reconciliation::test_support::{Harness, client_user},
    };
    use chrono::Duration;
    use uuid::Uuid;

    fn scheduled(sender_id: Uuid, schedule_date: DateTime<Utc>) -> AdminNotification {
        AdminNotification {
            id: Uuid::new_v4(),
            sender_id,
            kind: NotificationKind::Schedule.as_str().to_string(),
            title: "Maintenance".to_string(),
            body: "Tonight 2am".to_string(),
            schedule_date: Some(schedule_date),
            sent_date: None,
        }
    }

    #[tokio::test]
    async fn due_broadcast_reaches_every_client_once() {
        let harness = Harness::new();
        let now = Utc::now();
        let first = harness.client(now);
        let second = harness.client(now);
        let admin = Uuid::new_v4();
        harness.store.insert_user(client_user(now));
        let mut admin_user = client_user(now);
        admin_user.id = admin;
        admin_user.role = UserRole::Admin;
        harness.store.insert_user(admin_user);

        let due = scheduled(admin, now - Duration::minutes(1));
        let later = scheduled(admin, now + Duration::hours(1));
        harness.store.insert_admin_notification(due.clone());
        harness.store.insert_admin_notification(later.clone());

        let (outbox, mut rx) = NotificationOutbox::new(16);
        let usecase = ScheduledBroadcastsUseCase::new(Arc::clone(&harness.store), outbox);
        let report = usecase.run(now).await.unwrap();

        assert_eq!(report.applied, 1);
        let mut receivers = Vec::new();
        while let Ok(message) = rx.try_recv() {
            assert_eq!(message.sender_id, Some(admin));
            assert_eq!(message.title, "Maintenance");
            receivers.push(message.receiver_id);
        }
        assert_eq!(receivers.len(), 3);
        assert!(receivers.contains(&first));
        assert!(receivers.contains(&second));
        assert!(!receivers.contains(&admin));

        let state = harness.store.snapshot();
        let stamped = state
            .admin_notifications
            .iter()
            .find(|notification| notification.id == due.id)
            .unwrap();
        assert_eq!(stamped.sent_date, Some(now));
        let pending = state
            .admin_notifications
            .iter()
            .find(|notification| notification.id == later.id)
            .unwrap();
        assert!(pending.sent_date.is_none());

        let replay = usecase.run(now).await.unwrap();
        assert_eq!(replay, SweepReport::default());
    }

    fn recipients_of(harness: &Harness, now: DateTime<Utc>, count: usize) -> Vec<Uuid> {
        (0..count).map(|_| harness.client(now)).collect()
    }

    #[tokio::test]
    async fn broadcast_larger_than_the_queue_reaches_everyone() {
        let harness = Harness::new();
        let now = Utc::now();
        let clients = recipients_of(&harness, now, 10);
        let admin = Uuid::new_v4();
        let due = scheduled(admin, now - Duration::minutes(1));
        harness.store.insert_admin_notification(due.clone());

        let (outbox, mut rx) = NotificationOutbox::new(4);
        let consumer = tokio::spawn(async move {
            let mut receivers = Vec::new();
            while let Some(message) = rx.recv().await {
                receivers.push(message.receiver_id);
            }
            receivers
        });

        let report = ScheduledBroadcastsUseCase::new(Arc::clone(&harness.store), outbox)
            .run(now)
            .await
            .unwrap();
        let receivers = consumer.await.unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(receivers.len(), 10);
        assert!(clients.iter().all(|client| receivers.contains(client)));
        let state = harness.store.snapshot();
        assert_eq!(state.admin_notifications[0].sent_date, Some(now));
    }

    #[tokio::test]
    async fn broadcast_stays_due_when_messages_cannot_be_queued() {
        let harness = Harness::new();
        let now = Utc::now();
        recipients_of(&harness, now, 3);
        let due = scheduled(Uuid::new_v4(), now - Duration::minutes(1));
        harness.store.insert_admin_notification(due);

        let (outbox, rx) = NotificationOutbox::new(4);
        drop(rx);

        let result = ScheduledBroadcastsUseCase::new(Arc::clone(&harness.store), outbox)
            .run(now)
            .await;

        assert!(result.is_err());
        assert!(harness.store.snapshot().admin_notifications[0].sent_date.is_none());
    }
}
