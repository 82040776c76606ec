use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Effect, Transition, ensure_amount};
use crate::domain::{
    entities::{
        ledger::{AdminProfitAccrual, WalletTransaction},
        markers::{PendingMarker, TransientOrder},
        notifications::PushMessage,
        orders::{NewPurchasedOrder, PurchasedOrder, PurchasedOrderItem},
    },
    repositories::entitlement_store::{EntitlementTx, TxError, TxResult},
    value_objects::{
        enums::{boost_targets::BoostTarget, wallet_transaction_kinds::WalletTransactionKind},
        fees::FeeSchedule,
    },
};

/// Settles a paid checkout: sellers are credited their share, the platform share is
/// accrued, the order is recorded and the buyer's cart emptied.
pub(super) fn settle_order(
    tx: &mut dyn EntitlementTx,
    order: TransientOrder,
    amount_minor: Option<i64>,
    fees: FeeSchedule,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    ensure_amount(order.total_minor, amount_minor, "order amount")?;

    let mut out_of_stock = Vec::new();
    let mut out_of_stock_by_seller: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
    let mut gross_by_seller: BTreeMap<Uuid, i64> = BTreeMap::new();

    for item in &order.items {
        let product = tx
            .find_listing(BoostTarget::Product, item.product_id)?
            .ok_or_else(|| {
                TxError::precondition(format!("product {} no longer exists", item.product_id))
            })?;
        if product.owner_id != item.seller_id {
            return Err(TxError::precondition(format!(
                "product {} changed seller",
                item.product_id
            )));
        }
        if product.quantity == Some(0) {
            out_of_stock.push(product.id);
            out_of_stock_by_seller
                .entry(item.seller_id)
                .or_default()
                .push(product.id);
        }

        *gross_by_seller.entry(item.seller_id).or_default() +=
            item.price_minor * i64::from(item.quantity);
    }

    let mut seller_transfers = Vec::with_capacity(gross_by_seller.len());
    let mut messages = Vec::new();

    for (seller_id, gross_minor) in gross_by_seller {
        let transfer_minor = fees.seller_transfer(gross_minor);
        tx.credit_wallet(seller_id, transfer_minor)?;
        tx.append_wallet_transaction(&WalletTransaction {
            id: Uuid::new_v4(),
            user_id: seller_id,
            amount_minor: transfer_minor,
            kind: WalletTransactionKind::Sale,
            reference: order.payment_intent_id.clone(),
            created_at: now,
        })?;
        seller_transfers.push((seller_id, transfer_minor));

        if let Some(seller) = tx.find_user(seller_id)? {
            messages.push(
                PushMessage::to_user(
                    seller_id,
                    seller.device_tokens.clone(),
                    "New sale",
                    format!("{:.2} was added to your wallet.", transfer_minor as f64 / 100.0),
                )
                .with_data("type", "sale")
                .with_data("payment_intent_id", order.payment_intent_id.as_str()),
            );

            for product_id in out_of_stock_by_seller.get(&seller_id).into_iter().flatten() {
                messages.push(
                    PushMessage::to_user(
                        seller_id,
                        seller.device_tokens.clone(),
                        "Out of stock",
                        "One of your products is out of stock.".to_string(),
                    )
                    .with_data("type", "out_of_stock")
                    .with_data("product_id", product_id.to_string()),
                );
            }
        }
    }

    let transfer_total: i64 = seller_transfers.iter().map(|(_, amount)| amount).sum();
    tx.insert_admin_profit_accrual(&AdminProfitAccrual {
        payment_intent_id: order.payment_intent_id.clone(),
        transfer_amount_minor: transfer_total,
        created_at: now,
    })?;

    let order_id = Uuid::new_v4();
    tx.insert_purchased_order(&NewPurchasedOrder {
        order: PurchasedOrder {
            id: order_id,
            buyer_id: order.buyer_id,
            payment_intent_id: order.payment_intent_id.clone(),
            total_minor: order.total_minor,
            created_at: now,
        },
        items: order
            .items
            .iter()
            .map(|item| PurchasedOrderItem {
                purchased_order_id: order_id,
                product_id: item.product_id,
                seller_id: item.seller_id,
                price_minor: item.price_minor,
                quantity: item.quantity,
            })
            .collect(),
    })?;

    tx.clear_cart(order.buyer_id)?;
    let buyer_id = order.buyer_id;
    tx.delete_marker(&PendingMarker::TransientOrder(order))?;

    if let Some(buyer) = tx.find_user(buyer_id)? {
        messages.push(
            PushMessage::to_user(
                buyer_id,
                buyer.device_tokens,
                "Order confirmed",
                "Your payment was received.".to_string(),
            )
            .with_data("type", "order")
            .with_data("order_id", order_id.to_string()),
        );
    }

    let mut transition = Transition::applied(Effect::OrderSettled {
        order_id,
        seller_transfers,
        out_of_stock,
    });
    transition.messages = messages;
    Ok(transition)
}
