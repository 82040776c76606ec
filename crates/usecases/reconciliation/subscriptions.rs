use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Effect, SkipReason, Transition};
use crate::domain::{
    entities::{
        ledger::RevenueEntry,
        markers::{PendingMarker, SubscriptionIntent},
        notifications::PushMessage,
        users::{SubscriptionPlan, UserEntitlement, one_month_after},
    },
    repositories::entitlement_store::{EntitlementTx, TxError, TxResult},
    value_objects::{
        canonical_events::{SubscriptionEvent, SubscriptionEventKind},
        enums::{plan_names::PlanName, platforms::Platform, revenue_kinds::RevenueKind},
        plans::PlanBenefits,
    },
};

/// Billing period and price of a first activation.
#[derive(Debug, Clone, Copy)]
pub(super) struct ActivationTerms {
    /// Overrides the plan recorded on the intent when the provider reports one.
    pub plan: Option<PlanName>,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub price_minor: Option<i64>,
}

fn paid_benefits(plan: PlanName) -> TxResult<PlanBenefits> {
    plan.benefits()
        .filter(|_| plan.is_paid())
        .ok_or_else(|| TxError::precondition(format!("{plan} is not a paid plan")))
}

fn subscription_message(
    user: &UserEntitlement,
    title: &str,
    body: String,
    kind: &str,
) -> PushMessage {
    PushMessage::to_user(user.id, user.device_tokens.clone(), title, body)
        .with_data("type", "subscription")
        .with_data("event", kind)
}

pub(super) fn activate(
    tx: &mut dyn EntitlementTx,
    intent: SubscriptionIntent,
    terms: ActivationTerms,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    let plan = terms.plan.unwrap_or(intent.plan_name);
    let benefits = paid_benefits(plan)?;

    let user = tx
        .find_user(intent.user_id)?
        .ok_or_else(|| TxError::precondition(format!("user {} not found", intent.user_id)))?;
    if let Some(holder) = tx.find_user_by_subscription(intent.platform, &intent.transaction_id)? {
        if holder.id != user.id {
            return Err(TxError::precondition(format!(
                "transaction {} already belongs to user {}",
                intent.transaction_id, holder.id
            )));
        }
    }
    if terms.expires_at <= now {
        return Err(TxError::precondition(format!(
            "subscription expired at {}",
            terms.expires_at
        )));
    }

    let subscription = SubscriptionPlan::activate(
        intent.platform,
        intent.transaction_id.clone(),
        plan,
        benefits,
        terms.purchased_at,
        terms.expires_at,
    );
    tx.update_subscription(user.id, &subscription)?;
    tx.append_revenue(&RevenueEntry {
        id: Uuid::new_v4(),
        user_id: user.id,
        platform: intent.platform,
        transaction_id: intent.transaction_id.clone(),
        plan_name: plan.to_string(),
        purchased_at: terms.purchased_at,
        renewed_at: None,
        expires_at: Some(terms.expires_at),
        price_minor: terms.price_minor.unwrap_or(benefits.price_minor),
        cancelled_at: None,
        kind: RevenueKind::Subscription,
    })?;
    tx.delete_marker(&PendingMarker::Subscription(intent))?;

    let message = subscription_message(
        &user,
        "Subscription active",
        format!("Your {plan} plan is now active."),
        "activated",
    );
    Ok(Transition::applied(Effect::SubscriptionActivated {
        user_id: user.id,
        plan,
    })
    .notify(message))
}

pub(super) fn apply_subscription_event(
    tx: &mut dyn EntitlementTx,
    event: &SubscriptionEvent,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    if event.kind.is_active() {
        match tx.find_marker(&event.transaction_id)? {
            Some(PendingMarker::Subscription(intent)) => {
                if intent.platform != event.platform {
                    return Err(TxError::precondition(format!(
                        "intent for {} was created on {}",
                        event.transaction_id, intent.platform
                    )));
                }
                let terms = ActivationTerms {
                    plan: event.plan,
                    purchased_at: event.purchased_at.unwrap_or(now),
                    expires_at: event.expires_at.unwrap_or_else(|| one_month_after(now)),
                    price_minor: event.price_minor,
                };
                return activate(tx, intent, terms, now);
            }
            Some(other) => {
                return Ok(Transition::skipped(SkipReason::UnexpectedMarker(
                    other.kind(),
                )));
            }
            None => {}
        }
    }

    let Some(user) = tx.find_user_by_subscription(event.platform, &event.transaction_id)? else {
        return Ok(Transition::skipped(SkipReason::UnknownSubscription));
    };

    match event.kind {
        SubscriptionEventKind::Purchased
        | SubscriptionEventKind::Renewed
        | SubscriptionEventKind::InteractiveRenewal
        | SubscriptionEventKind::Recovered => renew_or_change(tx, user, event, now),
        SubscriptionEventKind::PlanChanged => change_plan(tx, user, event),
        SubscriptionEventKind::Cancelled
        | SubscriptionEventKind::Revoked
        | SubscriptionEventKind::Expired
        | SubscriptionEventKind::Refunded => end_subscription(tx, user, event, now),
        SubscriptionEventKind::FailedToRenew => {
            let message = subscription_message(
                &user,
                "Payment issue",
                format!(
                    "We could not renew your {} plan. Please update your payment details.",
                    user.subscription.name
                ),
                event.kind.as_str(),
            );
            Ok(Transition::applied(Effect::RenewalFailed { user_id: user.id }).notify(message))
        }
    }
}

fn renew_or_change(
    tx: &mut dyn EntitlementTx,
    user: UserEntitlement,
    event: &SubscriptionEvent,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    let current = &user.subscription;
    let later_expiry = match (event.expires_at, current.expires_at) {
        (Some(candidate), Some(stored)) => candidate > stored,
        (Some(_), None) => true,
        (None, _) => false,
    };

    if let (true, Some(expires_at)) = (later_expiry, event.expires_at) {
        let plan = event.plan.unwrap_or(current.name);
        let benefits = paid_benefits(plan)?;
        let renewed = current.renew(plan, benefits, now, expires_at);

        tx.update_subscription(user.id, &renewed)?;
        tx.append_revenue(&RevenueEntry {
            id: Uuid::new_v4(),
            user_id: user.id,
            platform: event.platform,
            transaction_id: event.transaction_id.clone(),
            plan_name: plan.to_string(),
            purchased_at: event.purchased_at.or(current.purchased_at).unwrap_or(now),
            renewed_at: Some(now),
            expires_at: Some(expires_at),
            price_minor: event.price_minor.unwrap_or(benefits.price_minor),
            cancelled_at: None,
            kind: RevenueKind::Subscription,
        })?;

        let message = subscription_message(
            &user,
            "Subscription renewed",
            format!("Your {plan} plan was renewed."),
            event.kind.as_str(),
        );
        return Ok(Transition::applied(Effect::SubscriptionRenewed {
            user_id: user.id,
            plan,
            expires_at,
        })
        .notify(message));
    }

    match event.plan {
        Some(plan) if plan != current.name => change_plan(tx, user, event),
        _ => Ok(Transition::skipped(SkipReason::AlreadyApplied)),
    }
}

fn change_plan(
    tx: &mut dyn EntitlementTx,
    user: UserEntitlement,
    event: &SubscriptionEvent,
) -> TxResult<Transition> {
    let plan = event.plan.ok_or_else(|| {
        TxError::precondition(format!("plan change for {} names no plan", event.transaction_id))
    })?;
    let benefits = paid_benefits(plan)?;
    let changed = user.subscription.with_plan(plan, benefits, event.expires_at);
    if changed == user.subscription {
        return Ok(Transition::skipped(SkipReason::AlreadyApplied));
    }

    tx.update_subscription(user.id, &changed)?;

    let message = subscription_message(
        &user,
        "Plan changed",
        format!("You are now on the {plan} plan."),
        SubscriptionEventKind::PlanChanged.as_str(),
    );
    Ok(Transition::applied(Effect::PlanChanged {
        user_id: user.id,
        plan,
    })
    .notify(message))
}

fn end_subscription(
    tx: &mut dyn EntitlementTx,
    user: UserEntitlement,
    event: &SubscriptionEvent,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    tx.update_subscription(user.id, &SubscriptionPlan::free(now))?;
    tx.stamp_revenue_cancelled(event.platform, &event.transaction_id, now)?;

    let message = subscription_message(
        &user,
        "Subscription ended",
        format!(
            "Your {} plan has ended. You are back on the Free Plan.",
            user.subscription.name
        ),
        event.kind.as_str(),
    );
    Ok(Transition::applied(Effect::SubscriptionEnded { user_id: user.id }).notify(message))
}

pub(super) fn cancel_pending_purchase(
    tx: &mut dyn EntitlementTx,
    platform: Platform,
    transaction_id: &str,
) -> TxResult<Transition> {
    match tx.find_marker(transaction_id)? {
        Some(PendingMarker::Subscription(intent)) if intent.platform != platform => {
            Err(TxError::precondition(format!(
                "intent for {} was created on {}",
                transaction_id, intent.platform
            )))
        }
        Some(marker @ PendingMarker::Subscription(_)) => {
            tx.delete_marker(&marker)?;
            Ok(Transition::applied(Effect::PendingPurchaseCanceled))
        }
        Some(other) => Ok(Transition::skipped(SkipReason::UnexpectedMarker(other.kind()))),
        None => Ok(Transition::skipped(SkipReason::NoMarker)),
    }
}
