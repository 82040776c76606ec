use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::{BATCH_LIMIT, SweepReport};
use crate::{
    domain::{
        entities::notifications::PushMessage,
        repositories::entitlement_store::{EntitlementStore, ExpiryCandidate},
        value_objects::enums::boost_targets::BoostTarget,
    },
    notifications::outbox::NotificationOutbox,
};

/// Slightly wider than the 15 minute tick so no expiry falls between two windows.
const WINDOW_MINUTES: i64 = 17;

/// `[now + 24h - 17m, now + 24h]`, both ends inclusive.
pub fn warning_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let to = now + Duration::hours(24);
    (to - Duration::minutes(WINDOW_MINUTES), to)
}

/// Warns owners a day before a paid plan or a boost lapses. One message per match and
/// tick; waits for queue room rather than dropping warnings.
pub struct ExpiryWarningsUseCase<S>
where
    S: EntitlementStore,
{
    store: Arc<S>,
    outbox: NotificationOutbox,
}

impl<S> ExpiryWarningsUseCase<S>
where
    S: EntitlementStore,
{
    pub fn new(store: Arc<S>, outbox: NotificationOutbox) -> Self {
        Self { store, outbox }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let (from, to) = warning_window(now);
        let mut report = SweepReport::default();

        let subscriptions = self
            .store
            .list_subscriptions_expiring_between(from, to, BATCH_LIMIT)
            .await?;
        self.warn_all(&mut report, subscriptions, |candidate| {
            (
                "Subscription expiring",
                format!("Your {} plan expires in 24 hours.", candidate.plan_name),
                "subscription_expiry",
            )
        })
        .await?;

        for target in [BoostTarget::Product, BoostTarget::Service] {
            let boosts = self
                .store
                .list_boosts_expiring_between(target, from, to, BATCH_LIMIT)
                .await?;
            self.warn_all(&mut report, boosts, |candidate| {
                (
                    "Boost expiring",
                    format!(
                        "The {} boost on \"{}\" expires in 24 hours.",
                        candidate.plan_name, candidate.title
                    ),
                    match target {
                        BoostTarget::Product => "product_boost_expiry",
                        BoostTarget::Service => "service_boost_expiry",
                    },
                )
            })
            .await?;
        }

        if report.scanned > 0 {
            info!(
                matched = report.scanned,
                queued = report.applied,
                "expiry_warnings: completed"
            );
        }
        Ok(report)
    }

    async fn warn_all<F>(
        &self,
        report: &mut SweepReport,
        candidates: Vec<ExpiryCandidate>,
        render: F,
    ) -> Result<()>
    where
        F: Fn(&ExpiryCandidate) -> (&'static str, String, &'static str),
    {
        report.scanned += candidates.len();

        for candidate in candidates {
            let (title, body, kind) = render(&candidate);
            let message =
                PushMessage::to_user(candidate.owner_id, candidate.device_tokens, title, body)
                    .with_data("type", kind)
                    .with_data("id", candidate.id.to_string());

            self.outbox
                .deliver(message)
                .await
                .with_context(|| format!("expiry warning for {} not queued", candidate.id))?;
            report.applied += 1;
        }
        Ok(())
    }
}
