use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Effect, Transition, ensure_amount};
use crate::domain::{
    entities::{
        ledger::{AdminProfitAccrual, RevenueEntry},
        listings::{BoostPlan, Listing},
        markers::{BoostIntent, PendingMarker},
        notifications::PushMessage,
    },
    repositories::entitlement_store::{EntitlementTx, TxError, TxResult},
    value_objects::enums::{boost_names::BoostName, boost_targets::BoostTarget, platforms::Platform},
};

fn boostable_listing(
    tx: &mut dyn EntitlementTx,
    target: BoostTarget,
    listing_id: Uuid,
    owner_id: Uuid,
    now: DateTime<Utc>,
) -> TxResult<Listing> {
    let listing = tx
        .find_listing(target, listing_id)?
        .ok_or_else(|| TxError::precondition(format!("{target} {listing_id} not found")))?;

    if listing.owner_id != owner_id {
        return Err(TxError::precondition(format!(
            "{target} {listing_id} is not owned by {owner_id}"
        )));
    }
    if !listing.is_active {
        return Err(TxError::precondition(format!("{target} {listing_id} is inactive")));
    }
    if listing.boost.is_boosted(now) {
        return Err(TxError::precondition(format!(
            "{target} {listing_id} is already boosted"
        )));
    }

    Ok(listing)
}

fn boosted_message(
    owner_id: Uuid,
    tokens: Vec<String>,
    listing: &Listing,
    boost: &BoostPlan,
) -> PushMessage {
    PushMessage::to_user(
        owner_id,
        tokens,
        "Boost activated",
        format!("\"{}\" is boosted with {}.", listing.title, boost.name),
    )
    .with_data("type", "boost")
    .with_data("target", listing.target.as_str())
    .with_data("listing_id", listing.id.to_string())
}

pub(super) fn activate_boost(
    tx: &mut dyn EntitlementTx,
    intent: BoostIntent,
    amount_minor: Option<i64>,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    let tier = intent.boost_name.tier().ok_or_else(|| {
        TxError::precondition(format!("{} cannot be purchased", intent.boost_name))
    })?;
    ensure_amount(tier.price_minor, amount_minor, "boost amount")?;

    let listing = boostable_listing(tx, intent.target, intent.listing_id, intent.owner_id, now)?;
    let boost = BoostPlan::purchase(intent.boost_name, intent.payment_intent_id.clone(), now)
        .ok_or_else(|| TxError::precondition("boost has no duration"))?;

    tx.update_boost(intent.target, listing.id, &boost)?;
    tx.append_revenue(&RevenueEntry {
        id: Uuid::new_v4(),
        user_id: intent.owner_id,
        platform: Platform::Stripe,
        transaction_id: intent.payment_intent_id.clone(),
        plan_name: intent.boost_name.to_string(),
        purchased_at: now,
        renewed_at: None,
        expires_at: boost.expires_at,
        price_minor: tier.price_minor,
        cancelled_at: None,
        kind: intent.target.revenue_kind(),
    })?;
    tx.insert_admin_profit_accrual(&AdminProfitAccrual {
        payment_intent_id: intent.payment_intent_id.clone(),
        transfer_amount_minor: 0,
        created_at: now,
    })?;

    let owner_id = intent.owner_id;
    let target = intent.target;
    tx.delete_marker(&PendingMarker::Boost(intent))?;

    let tokens = tx
        .find_user(owner_id)?
        .map(|owner| owner.device_tokens)
        .unwrap_or_default();

    Ok(Transition::applied(Effect::BoostActivated {
        target,
        listing_id: listing.id,
        expires_at: boost.expires_at.unwrap_or(now),
    })
    .notify(boosted_message(owner_id, tokens, &listing, &boost)))
}

pub(super) fn redeem_plan_boost(
    tx: &mut dyn EntitlementTx,
    user_id: Uuid,
    target: BoostTarget,
    listing_id: Uuid,
    boost_name: BoostName,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    let user = tx
        .find_user(user_id)?
        .ok_or_else(|| TxError::precondition(format!("user {user_id} not found")))?;
    if user.subscription.available_boosts <= 0 {
        return Err(TxError::precondition(format!(
            "user {user_id} has no boosts left on {}",
            user.subscription.name
        )));
    }

    let listing = boostable_listing(tx, target, listing_id, user_id, now)?;
    let boost = BoostPlan::purchase(boost_name, format!("plan-allowance-{}", Uuid::new_v4()), now)
        .ok_or_else(|| TxError::precondition(format!("{boost_name} cannot be redeemed")))?;

    let mut subscription = user.subscription.clone();
    subscription.available_boosts -= 1;
    tx.update_subscription(user_id, &subscription)?;
    tx.update_boost(target, listing_id, &boost)?;

    Ok(Transition::applied(Effect::BoostActivated {
        target,
        listing_id,
        expires_at: boost.expires_at.unwrap_or(now),
    })
    .notify(boosted_message(user_id, user.device_tokens, &listing, &boost)))
}
