//! Transactional application of canonical events to entitlements.
//!
//! Every apply runs as one store transaction: look up the pending-payment marker (or
//! the subscription owner), re-check preconditions, mutate entitlements, append ledger
//! records, consume the marker. Push messages are collected inside the transaction and
//! handed to the outbox only after commit.

mod accounts;
mod boosts;
mod orders;
mod subscriptions;
mod wallet;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        entities::{markers::PendingMarker, notifications::PushMessage, users::one_month_after},
        repositories::entitlement_store::{EntitlementStore, EntitlementTx, TxError, TxResult},
        value_objects::{
            canonical_events::CanonicalEvent,
            enums::{boost_names::BoostName, boost_targets::BoostTarget, plan_names::PlanName},
            fees::FeeSchedule,
        },
    },
    notifications::outbox::NotificationOutbox,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Effect),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OrderSettled {
        order_id: Uuid,
        seller_transfers: Vec<(Uuid, i64)>,
        out_of_stock: Vec<Uuid>,
    },
    WalletToppedUp {
        user_id: Uuid,
        net_minor: i64,
    },
    BoostActivated {
        target: BoostTarget,
        listing_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    SubscriptionActivated {
        user_id: Uuid,
        plan: PlanName,
    },
    SubscriptionRenewed {
        user_id: Uuid,
        plan: PlanName,
        expires_at: DateTime<Utc>,
    },
    PlanChanged {
        user_id: Uuid,
        plan: PlanName,
    },
    SubscriptionEnded {
        user_id: Uuid,
    },
    RenewalFailed {
        user_id: Uuid,
    },
    PendingPurchaseCanceled,
    PaymentMethodCleared {
        users: usize,
    },
    CustomerCleared {
        users: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No pending-payment marker under the key: already consumed or never created.
    NoMarker,
    /// A marker exists under the key but belongs to another payment flow.
    UnexpectedMarker(&'static str),
    UnknownSubscription,
    AlreadyApplied,
}

/// Result of a unit of work plus the messages to send once it commits.
#[derive(Debug)]
pub(crate) struct Transition {
    outcome: Outcome,
    messages: Vec<PushMessage>,
}

impl Transition {
    fn applied(effect: Effect) -> Self {
        Self {
            outcome: Outcome::Applied(effect),
            messages: Vec::new(),
        }
    }

    fn skipped(reason: SkipReason) -> Self {
        Self {
            outcome: Outcome::Skipped(reason),
            messages: Vec::new(),
        }
    }

    fn notify(mut self, message: PushMessage) -> Self {
        self.messages.push(message);
        self
    }
}

fn ensure_amount(expected_minor: i64, received_minor: Option<i64>, what: &str) -> TxResult<()> {
    match received_minor {
        Some(received) if received != expected_minor => Err(TxError::precondition(format!(
            "{what}: received {received} but expected {expected_minor}"
        ))),
        _ => Ok(()),
    }
}

pub struct ReconciliationEngine<S>
where
    S: EntitlementStore,
{
    store: Arc<S>,
    fees: FeeSchedule,
    outbox: NotificationOutbox,
}

impl<S> ReconciliationEngine<S>
where
    S: EntitlementStore,
{
    pub fn new(store: Arc<S>, fees: FeeSchedule, outbox: NotificationOutbox) -> Self {
        Self {
            store,
            fees,
            outbox,
        }
    }

    /// Applies one canonical event. Replays of an applied event are skipped.
    pub async fn apply(&self, event: CanonicalEvent) -> Result<Outcome, TxError> {
        let name = event.name();
        let reference = match &event {
            CanonicalEvent::PaymentSucceeded {
                provider_reference, ..
            } => provider_reference.clone(),
            CanonicalEvent::PaymentMethodDetached { payment_method_id } => payment_method_id.clone(),
            CanonicalEvent::CustomerDeleted { customer_id } => customer_id.clone(),
            CanonicalEvent::Subscription(subscription) => subscription.transaction_id.clone(),
            CanonicalEvent::PendingPurchaseCanceled { transaction_id, .. } => {
                transaction_id.clone()
            }
        };
        let fees = self.fees;
        let now = Utc::now();

        self.commit(name, reference, move |tx| match event {
            CanonicalEvent::PaymentSucceeded {
                provider_reference,
                amount_minor,
            } => payment_succeeded(tx, &provider_reference, amount_minor, fees, now),
            CanonicalEvent::PaymentMethodDetached { payment_method_id } => {
                accounts::clear_payment_method(tx, &payment_method_id)
            }
            CanonicalEvent::CustomerDeleted { customer_id } => {
                accounts::clear_customer(tx, &customer_id)
            }
            CanonicalEvent::Subscription(subscription) => {
                subscriptions::apply_subscription_event(tx, &subscription, now)
            }
            CanonicalEvent::PendingPurchaseCanceled {
                platform,
                transaction_id,
            } => subscriptions::cancel_pending_purchase(tx, platform, &transaction_id),
        })
        .await
    }

    /// Spends one boost from the owner's plan allowance on a listing.
    pub async fn redeem_plan_boost(
        &self,
        user_id: Uuid,
        target: BoostTarget,
        listing_id: Uuid,
        boost: BoostName,
    ) -> Result<Outcome, TxError> {
        let now = Utc::now();

        self.commit("redeem_plan_boost", listing_id.to_string(), move |tx| {
            boosts::redeem_plan_boost(tx, user_id, target, listing_id, boost, now)
        })
        .await
    }

    async fn commit<F>(
        &self,
        event: &'static str,
        reference: String,
        work: F,
    ) -> Result<Outcome, TxError>
    where
        F: FnOnce(&mut dyn EntitlementTx) -> TxResult<Transition> + Send + 'static,
    {
        match self.store.transaction(work).await {
            Ok(Transition { outcome, messages }) => {
                let queued = self.outbox.enqueue_all(messages);
                match &outcome {
                    Outcome::Applied(effect) => info!(
                        event,
                        reference = %reference,
                        effect = ?effect,
                        queued,
                        "reconciliation: applied"
                    ),
                    Outcome::Skipped(reason) => info!(
                        event,
                        reference = %reference,
                        reason = ?reason,
                        "reconciliation: skipped"
                    ),
                }
                Ok(outcome)
            }
            Err(TxError::Precondition(reason)) => {
                warn!(
                    event,
                    reference = %reference,
                    reason = %reason,
                    "reconciliation: precondition failed; rolled back"
                );
                Err(TxError::Precondition(reason))
            }
            Err(TxError::Store(err)) => {
                error!(
                    event,
                    reference = %reference,
                    error = ?err,
                    "reconciliation: store failure; rolled back, marker kept"
                );
                Err(TxError::Store(err))
            }
        }
    }
}

fn payment_succeeded(
    tx: &mut dyn EntitlementTx,
    payment_intent_id: &str,
    amount_minor: Option<i64>,
    fees: FeeSchedule,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    match tx.find_marker(payment_intent_id)? {
        None => Ok(Transition::skipped(SkipReason::NoMarker)),
        Some(PendingMarker::TransientOrder(order)) => {
            orders::settle_order(tx, order, amount_minor, fees, now)
        }
        Some(PendingMarker::WalletTopUp(top_up)) => {
            wallet::settle_top_up(tx, top_up, amount_minor, fees, now)
        }
        Some(PendingMarker::Boost(intent)) => boosts::activate_boost(tx, intent, amount_minor, now),
        Some(PendingMarker::Subscription(intent)) => subscriptions::activate(
            tx,
            intent,
            subscriptions::ActivationTerms {
                plan: None,
                purchased_at: now,
                expires_at: one_month_after(now),
                price_minor: amount_minor,
            },
            now,
        ),
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests;
