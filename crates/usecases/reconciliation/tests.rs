use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{Effect, Outcome, SkipReason, test_support::Harness};
use crate::domain::{
    entities::{
        markers::{
            BoostIntent, PendingMarker, SubscriptionIntent, TransientOrder, TransientOrderItem,
            WalletTopUp,
        },
        orders::CartItem,
        users::SubscriptionPlan,
    },
    repositories::entitlement_store::TxError,
    value_objects::{
        canonical_events::{CanonicalEvent, SubscriptionEvent, SubscriptionEventKind},
        enums::{
            boost_names::BoostName, boost_targets::BoostTarget, plan_names::PlanName,
            platforms::Platform, revenue_kinds::RevenueKind,
            wallet_transaction_kinds::WalletTransactionKind,
        },
    },
};

fn paid(pi: &str, amount_minor: Option<i64>) -> CanonicalEvent {
    CanonicalEvent::PaymentSucceeded {
        provider_reference: pi.to_string(),
        amount_minor,
    }
}

fn order_marker(buyer_id: Uuid, pi: &str, items: Vec<TransientOrderItem>) -> PendingMarker {
    let total_minor = items
        .iter()
        .map(|item| item.price_minor * i64::from(item.quantity))
        .sum();
    PendingMarker::TransientOrder(TransientOrder {
        id: Uuid::new_v4(),
        buyer_id,
        payment_intent_id: pi.to_string(),
        total_minor,
        created_at: Utc::now(),
        items,
    })
}

fn item(product_id: Uuid, seller_id: Uuid, price_minor: i64, quantity: i32) -> TransientOrderItem {
    TransientOrderItem {
        product_id,
        seller_id,
        price_minor,
        quantity,
    }
}

fn subscription_event(
    kind: SubscriptionEventKind,
    transaction_id: &str,
    plan: Option<PlanName>,
    expires_in_days: Option<i64>,
) -> CanonicalEvent {
    let mut event = SubscriptionEvent::new(Platform::Apple, kind, transaction_id.to_string());
    event.plan = plan;
    event.expires_at = expires_in_days.map(|days| Utc::now() + Duration::days(days));
    CanonicalEvent::Subscription(event)
}

fn subscription_intent(user_id: Uuid, transaction_id: &str, plan: PlanName) -> PendingMarker {
    PendingMarker::Subscription(SubscriptionIntent {
        id: Uuid::new_v4(),
        user_id,
        platform: Platform::Apple,
        key: transaction_id.to_string(),
        transaction_id: transaction_id.to_string(),
        plan_name: plan,
        created_at: Utc::now(),
    })
}

#[tokio::test]
async fn test_order_settlement_credits_sellers_and_consumes_marker() {
    let mut harness = Harness::new();
    let now = Utc::now();
    let buyer = harness.client(now);
    let seller_a = harness.client(now);
    let seller_b = harness.client(now);
    let product_a = harness.product(seller_a, 1000, 5);
    let product_b = harness.product(seller_b, 2000, 5);

    harness.store.insert_cart_item(CartItem {
        user_id: buyer,
        product_id: product_a,
        quantity: 1,
    });
    harness.store.insert_marker(order_marker(
        buyer,
        "pi_order",
        vec![
            item(product_a, seller_a, 1000, 1),
            item(product_b, seller_b, 2000, 2),
        ],
    ));

    let outcome = harness
        .engine
        .apply(paid("pi_order", Some(5000)))
        .await
        .unwrap();

    let Outcome::Applied(Effect::OrderSettled {
        seller_transfers,
        out_of_stock,
        ..
    }) = outcome
    else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert!(out_of_stock.is_empty());
    assert!(seller_transfers.contains(&(seller_a, 900)));
    assert!(seller_transfers.contains(&(seller_b, 3600)));

    let state = harness.store.snapshot();
    assert_eq!(state.user(seller_a).unwrap().wallet_balance_minor, 900);
    assert_eq!(state.user(seller_b).unwrap().wallet_balance_minor, 3600);
    assert_eq!(
        state.admin_profit_accruals["pi_order"].transfer_amount_minor,
        4500
    );
    assert!(state.cart_items.is_empty());
    assert!(state.markers.is_empty());
    assert_eq!(state.purchased_orders.len(), 1);
    assert_eq!(state.purchased_orders[0].items.len(), 2);
    assert_eq!(
        state
            .wallet_transactions
            .iter()
            .filter(|entry| entry.kind == WalletTransactionKind::Sale)
            .count(),
        2
    );

    let messages = harness.drain_messages();
    assert!(messages.iter().any(|message| message.receiver_id == buyer));
    assert!(messages.iter().any(|message| message.receiver_id == seller_a));
}

#[tokio::test]
async fn test_replayed_payment_is_skipped_without_double_credit() {
    let harness = Harness::new();
    let now = Utc::now();
    let buyer = harness.client(now);
    let seller = harness.client(now);
    let product = harness.product(seller, 1000, 3);
    harness.store.insert_marker(order_marker(
        buyer,
        "pi_replay",
        vec![item(product, seller, 1000, 1)],
    ));

    harness.engine.apply(paid("pi_replay", None)).await.unwrap();
    let replay = harness.engine.apply(paid("pi_replay", None)).await.unwrap();

    assert_eq!(replay, Outcome::Skipped(SkipReason::NoMarker));
    let state = harness.store.snapshot();
    assert_eq!(state.user(seller).unwrap().wallet_balance_minor, 900);
    assert_eq!(state.purchased_orders.len(), 1);
}

#[tokio::test]
async fn test_failure_before_commit_leaves_state_untouched() {
    let harness = Harness::new();
    let now = Utc::now();
    let buyer = harness.client(now);
    let seller = harness.client(now);
    let product = harness.product(seller, 1000, 3);
    harness.store.insert_marker(order_marker(
        buyer,
        "pi_atomic",
        vec![item(product, seller, 1000, 2)],
    ));

    harness.store.set_fail_before_commit(true);
    let result = harness.engine.apply(paid("pi_atomic", Some(2000))).await;
    assert!(matches!(result, Err(TxError::Store(_))));

    let state = harness.store.snapshot();
    assert_eq!(state.user(seller).unwrap().wallet_balance_minor, 0);
    assert!(state.markers.contains_key("pi_atomic"));
    assert!(state.admin_profit_accruals.is_empty());
    assert!(state.purchased_orders.is_empty());

    harness.store.set_fail_before_commit(false);
    let outcome = harness
        .engine
        .apply(paid("pi_atomic", Some(2000)))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Applied(Effect::OrderSettled { .. })));
    assert_eq!(
        harness
            .store
            .snapshot()
            .user(seller)
            .unwrap()
            .wallet_balance_minor,
        1800
    );
}

#[tokio::test]
async fn test_order_amount_mismatch_is_rejected() {
    let harness = Harness::new();
    let now = Utc::now();
    let buyer = harness.client(now);
    let seller = harness.client(now);
    let product = harness.product(seller, 1000, 3);
    harness.store.insert_marker(order_marker(
        buyer,
        "pi_short",
        vec![item(product, seller, 1000, 1)],
    ));

    let result = harness.engine.apply(paid("pi_short", Some(999))).await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
    assert!(harness.store.snapshot().markers.contains_key("pi_short"));
}

#[tokio::test]
async fn test_order_rejected_when_product_changed_seller() {
    let harness = Harness::new();
    let now = Utc::now();
    let buyer = harness.client(now);
    let seller = harness.client(now);
    let other = harness.client(now);
    let product = harness.product(other, 1000, 3);
    harness.store.insert_marker(order_marker(
        buyer,
        "pi_moved",
        vec![item(product, seller, 1000, 1)],
    ));

    let result = harness.engine.apply(paid("pi_moved", None)).await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
    assert_eq!(
        harness.store.snapshot().user(seller).unwrap().wallet_balance_minor,
        0
    );
}

#[tokio::test]
async fn test_sold_out_products_are_reported_to_their_seller() {
    let mut harness = Harness::new();
    let now = Utc::now();
    let buyer = harness.client(now);
    let seller = harness.client(now);
    let sold_out = harness.product(seller, 500, 0);
    harness.store.insert_marker(order_marker(
        buyer,
        "pi_last",
        vec![item(sold_out, seller, 500, 1)],
    ));

    let outcome = harness.engine.apply(paid("pi_last", None)).await.unwrap();

    let Outcome::Applied(Effect::OrderSettled { out_of_stock, .. }) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(out_of_stock, vec![sold_out]);
    assert!(harness.drain_messages().iter().any(|message| {
        message.receiver_id == seller
            && message.data.get("type").map(String::as_str) == Some("out_of_stock")
    }));
}

#[tokio::test]
async fn test_wallet_top_up_credits_net_amount() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness.store.insert_marker(PendingMarker::WalletTopUp(WalletTopUp {
        id: Uuid::new_v4(),
        user_id: user,
        payment_intent_id: "pi_top_up".to_string(),
        amount_minor: 10000,
        created_at: now,
    }));

    let outcome = harness
        .engine
        .apply(paid("pi_top_up", Some(10000)))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Applied(Effect::WalletToppedUp {
            user_id: user,
            net_minor: 9680,
        })
    );
    let state = harness.store.snapshot();
    assert_eq!(state.user(user).unwrap().wallet_balance_minor, 9680);
    assert_eq!(state.wallet_transactions[0].kind, WalletTransactionKind::TopUp);
    assert!(state.markers.is_empty());
}

#[tokio::test]
async fn test_top_up_smaller_than_fees_is_rejected() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness.store.insert_marker(PendingMarker::WalletTopUp(WalletTopUp {
        id: Uuid::new_v4(),
        user_id: user,
        payment_intent_id: "pi_tiny".to_string(),
        amount_minor: 20,
        created_at: now,
    }));

    let result = harness.engine.apply(paid("pi_tiny", None)).await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
    assert!(harness.store.snapshot().markers.contains_key("pi_tiny"));
}

fn boost_intent(owner_id: Uuid, target: BoostTarget, listing_id: Uuid, pi: &str) -> PendingMarker {
    PendingMarker::Boost(BoostIntent {
        id: Uuid::new_v4(),
        owner_id,
        target,
        listing_id,
        boost_name: BoostName::QuickStart,
        payment_intent_id: pi.to_string(),
        created_at: Utc::now(),
    })
}

#[tokio::test]
async fn test_boost_activation_records_revenue_and_accrual() {
    let harness = Harness::new();
    let now = Utc::now();
    let owner = harness.client(now);
    let service = harness.service(owner);
    harness
        .store
        .insert_marker(boost_intent(owner, BoostTarget::Service, service, "pi_boost"));

    let outcome = harness
        .engine
        .apply(paid("pi_boost", Some(2899)))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Applied(Effect::BoostActivated { .. })));

    let state = harness.store.snapshot();
    let listing = state.listing(BoostTarget::Service, service).unwrap();
    assert_eq!(listing.boost.name, BoostName::QuickStart);
    assert_eq!(listing.boost.transaction_id.as_deref(), Some("pi_boost"));
    let expires_at = listing.boost.expires_at.unwrap();
    let purchased_at = listing.boost.purchased_at.unwrap();
    assert_eq!(expires_at - purchased_at, Duration::days(7));

    assert_eq!(state.revenue_entries.len(), 1);
    assert_eq!(state.revenue_entries[0].kind, RevenueKind::Service);
    assert_eq!(state.revenue_entries[0].price_minor, 2899);
    assert_eq!(state.admin_profit_accruals["pi_boost"].transfer_amount_minor, 0);
    assert!(state.markers.is_empty());
}

#[tokio::test]
async fn test_boost_rejected_while_listing_already_boosted() {
    let harness = Harness::new();
    let now = Utc::now();
    let owner = harness.client(now);
    let product = harness.product(owner, 1500, 2);
    harness
        .store
        .insert_marker(boost_intent(owner, BoostTarget::Product, product, "pi_first"));
    harness
        .store
        .insert_marker(boost_intent(owner, BoostTarget::Product, product, "pi_second"));

    harness.engine.apply(paid("pi_first", None)).await.unwrap();
    let second = harness.engine.apply(paid("pi_second", None)).await;

    assert!(matches!(second, Err(TxError::Precondition(_))));
    let state = harness.store.snapshot();
    assert!(state.markers.contains_key("pi_second"));
    assert_eq!(state.revenue_entries.len(), 1);
}

#[tokio::test]
async fn test_boost_amount_must_match_tier_price() {
    let harness = Harness::new();
    let now = Utc::now();
    let owner = harness.client(now);
    let product = harness.product(owner, 1500, 2);
    harness
        .store
        .insert_marker(boost_intent(owner, BoostTarget::Product, product, "pi_cheap"));

    let result = harness.engine.apply(paid("pi_cheap", Some(100))).await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
}

#[tokio::test]
async fn test_plan_boost_spends_allowance() {
    let harness = Harness::new();
    let now = Utc::now();
    let owner = harness.client(now);
    let product = harness.product(owner, 1500, 2);
    let other = harness.product(owner, 1500, 2);

    let mut user = harness.store.snapshot().user(owner).unwrap().clone();
    user.subscription = SubscriptionPlan::activate(
        Platform::Stripe,
        "sub_basic".to_string(),
        PlanName::Basic,
        PlanName::Basic.benefits().unwrap(),
        now,
        now + Duration::days(30),
    );
    harness.store.insert_user(user);

    let outcome = harness
        .engine
        .redeem_plan_boost(owner, BoostTarget::Product, product, BoostName::MaximumImpact)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Applied(Effect::BoostActivated { .. })));

    let state = harness.store.snapshot();
    assert_eq!(state.user(owner).unwrap().subscription.available_boosts, 0);
    assert!(state.revenue_entries.is_empty());
    let boost = &state.listing(BoostTarget::Product, product).unwrap().boost;
    assert!(
        boost
            .transaction_id
            .as_deref()
            .is_some_and(|id| id.starts_with("plan-allowance-"))
    );

    let exhausted = harness
        .engine
        .redeem_plan_boost(owner, BoostTarget::Product, other, BoostName::QuickStart)
        .await;
    assert!(matches!(exhausted, Err(TxError::Precondition(_))));
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness
        .store
        .insert_marker(subscription_intent(user, "orig-1", PlanName::Premium));

    let purchased = subscription_event(
        SubscriptionEventKind::Purchased,
        "orig-1",
        Some(PlanName::Premium),
        Some(30),
    );
    let outcome = harness.engine.apply(purchased.clone()).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Applied(Effect::SubscriptionActivated {
            user_id: user,
            plan: PlanName::Premium,
        })
    );

    let state = harness.store.snapshot();
    let subscription = &state.user(user).unwrap().subscription;
    assert_eq!(subscription.name, PlanName::Premium);
    assert_eq!(subscription.available_postings, 10000);
    assert_eq!(subscription.available_boosts, 6);
    assert!(subscription.wishlist_feature);
    assert_eq!(subscription.transaction_id.as_deref(), Some("orig-1"));
    assert!(state.markers.is_empty());

    let replay = harness.engine.apply(purchased).await.unwrap();
    assert_eq!(replay, Outcome::Skipped(SkipReason::AlreadyApplied));

    let renewed = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Renewed,
            "orig-1",
            Some(PlanName::Premium),
            Some(60),
        ))
        .await
        .unwrap();
    assert!(matches!(
        renewed,
        Outcome::Applied(Effect::SubscriptionRenewed { .. })
    ));
    let state = harness.store.snapshot();
    assert!(state.user(user).unwrap().subscription.renewed_at.is_some());
    assert_eq!(state.revenue_entries.len(), 2);
    assert!(state.revenue_entries[1].renewed_at.is_some());

    let expired = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Expired,
            "orig-1",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(
        expired,
        Outcome::Applied(Effect::SubscriptionEnded { user_id: user })
    );

    let state = harness.store.snapshot();
    let subscription = &state.user(user).unwrap().subscription;
    assert_eq!(subscription.name, PlanName::FreePlan);
    assert_eq!(subscription.platform, Platform::None);
    assert!(subscription.transaction_id.is_none());
    assert_eq!(subscription.available_postings, 1);
    assert_eq!(subscription.available_boosts, 0);
    assert!(
        state
            .revenue_entries
            .iter()
            .all(|entry| entry.cancelled_at.is_some())
    );

    let again = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Expired,
            "orig-1",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(again, Outcome::Skipped(SkipReason::UnknownSubscription));
}

#[tokio::test]
async fn test_activation_rejected_when_transaction_belongs_to_another_user() {
    let harness = Harness::new();
    let now = Utc::now();
    let holder = harness.client(now);
    let claimant = harness.client(now);

    let mut holder_user = harness.store.snapshot().user(holder).unwrap().clone();
    holder_user.subscription = SubscriptionPlan::activate(
        Platform::Apple,
        "orig-shared".to_string(),
        PlanName::Basic,
        PlanName::Basic.benefits().unwrap(),
        now,
        now + Duration::days(30),
    );
    harness.store.insert_user(holder_user);
    harness
        .store
        .insert_marker(subscription_intent(claimant, "orig-shared", PlanName::Basic));

    let result = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Purchased,
            "orig-shared",
            None,
            Some(30),
        ))
        .await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
    assert!(harness.store.snapshot().markers.contains_key("orig-shared"));
}

#[tokio::test]
async fn test_activation_rejected_for_past_expiry() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness
        .store
        .insert_marker(subscription_intent(user, "orig-stale", PlanName::Standard));

    let result = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Purchased,
            "orig-stale",
            None,
            Some(-1),
        ))
        .await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
}

#[tokio::test]
async fn test_plan_change_keeps_expiry_and_skips_ledger() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness
        .store
        .insert_marker(subscription_intent(user, "orig-2", PlanName::Basic));
    harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Purchased,
            "orig-2",
            None,
            Some(30),
        ))
        .await
        .unwrap();
    let expires_before = harness
        .store
        .snapshot()
        .user(user)
        .unwrap()
        .subscription
        .expires_at;

    let outcome = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::PlanChanged,
            "orig-2",
            Some(PlanName::Standard),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Applied(Effect::PlanChanged {
            user_id: user,
            plan: PlanName::Standard,
        })
    );
    let state = harness.store.snapshot();
    let subscription = &state.user(user).unwrap().subscription;
    assert_eq!(subscription.available_postings, 5);
    assert_eq!(subscription.available_boosts, 3);
    assert_eq!(subscription.expires_at, expires_before);
    assert_eq!(state.revenue_entries.len(), 1);
}

#[tokio::test]
async fn test_failed_renewal_only_notifies() {
    let mut harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness
        .store
        .insert_marker(subscription_intent(user, "orig-3", PlanName::Basic));
    harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Purchased,
            "orig-3",
            None,
            Some(30),
        ))
        .await
        .unwrap();
    harness.drain_messages();
    let before = harness.store.snapshot().user(user).unwrap().clone();

    let outcome = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::FailedToRenew,
            "orig-3",
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Applied(Effect::RenewalFailed { user_id: user }));
    assert_eq!(harness.store.snapshot().user(user).unwrap(), &before);
    assert_eq!(harness.drain_messages().len(), 1);
}

#[tokio::test]
async fn test_subscription_event_under_foreign_marker_is_skipped() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness.store.insert_marker(PendingMarker::WalletTopUp(WalletTopUp {
        id: Uuid::new_v4(),
        user_id: user,
        payment_intent_id: "shared-key".to_string(),
        amount_minor: 1000,
        created_at: now,
    }));

    let outcome = harness
        .engine
        .apply(subscription_event(
            SubscriptionEventKind::Purchased,
            "shared-key",
            None,
            Some(30),
        ))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::UnexpectedMarker("wallet_top_up"))
    );
    assert!(harness.store.snapshot().markers.contains_key("shared-key"));
}

#[tokio::test]
async fn test_pending_purchase_cancel_removes_intent() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness
        .store
        .insert_marker(subscription_intent(user, "token-1", PlanName::Basic));

    let event = CanonicalEvent::PendingPurchaseCanceled {
        platform: Platform::Apple,
        transaction_id: "token-1".to_string(),
    };
    let outcome = harness.engine.apply(event.clone()).await.unwrap();
    assert_eq!(outcome, Outcome::Applied(Effect::PendingPurchaseCanceled));
    assert!(harness.store.snapshot().markers.is_empty());

    let replay = harness.engine.apply(event).await.unwrap();
    assert_eq!(replay, Outcome::Skipped(SkipReason::NoMarker));
}

#[tokio::test]
async fn test_pending_purchase_cancel_from_another_store_keeps_intent() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    harness
        .store
        .insert_marker(subscription_intent(user, "token-1", PlanName::Basic));

    let result = harness
        .engine
        .apply(CanonicalEvent::PendingPurchaseCanceled {
            platform: Platform::Google,
            transaction_id: "token-1".to_string(),
        })
        .await;

    assert!(matches!(result, Err(TxError::Precondition(_))));
    assert!(harness.store.snapshot().markers.contains_key("token-1"));
}

#[tokio::test]
async fn test_detached_payment_method_and_deleted_customer_are_cleared() {
    let harness = Harness::new();
    let now = Utc::now();
    let user = harness.client(now);
    let mut entitlement = harness.store.snapshot().user(user).unwrap().clone();
    entitlement.stripe_customer_id = Some("cus_1".to_string());
    entitlement.stripe_default_payment_method = Some("pm_1".to_string());
    harness.store.insert_user(entitlement);

    let detached = harness
        .engine
        .apply(CanonicalEvent::PaymentMethodDetached {
            payment_method_id: "pm_1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        detached,
        Outcome::Applied(Effect::PaymentMethodCleared { users: 1 })
    );

    let deleted = harness
        .engine
        .apply(CanonicalEvent::CustomerDeleted {
            customer_id: "cus_1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(deleted, Outcome::Applied(Effect::CustomerCleared { users: 1 }));

    let state = harness.store.snapshot();
    let entitlement = state.user(user).unwrap();
    assert!(entitlement.stripe_customer_id.is_none());
    assert!(entitlement.stripe_default_payment_method.is_none());
}
