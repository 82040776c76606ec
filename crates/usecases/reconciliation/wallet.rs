use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Effect, Transition, ensure_amount};
use crate::domain::{
    entities::{
        ledger::WalletTransaction,
        markers::{PendingMarker, WalletTopUp},
        notifications::PushMessage,
    },
    repositories::entitlement_store::{EntitlementTx, TxError, TxResult},
    value_objects::{enums::wallet_transaction_kinds::WalletTransactionKind, fees::FeeSchedule},
};

pub(super) fn settle_top_up(
    tx: &mut dyn EntitlementTx,
    top_up: WalletTopUp,
    amount_minor: Option<i64>,
    fees: FeeSchedule,
    now: DateTime<Utc>,
) -> TxResult<Transition> {
    let user = tx
        .find_user(top_up.user_id)?
        .ok_or_else(|| TxError::precondition(format!("user {} not found", top_up.user_id)))?;
    ensure_amount(top_up.amount_minor, amount_minor, "top-up amount")?;

    let net_minor = fees.top_up_net(top_up.amount_minor);
    if net_minor <= 0 {
        return Err(TxError::precondition(format!(
            "top-up of {} nets {net_minor} after fees",
            top_up.amount_minor
        )));
    }

    tx.credit_wallet(user.id, net_minor)?;
    tx.append_wallet_transaction(&WalletTransaction {
        id: Uuid::new_v4(),
        user_id: user.id,
        amount_minor: net_minor,
        kind: WalletTransactionKind::TopUp,
        reference: top_up.payment_intent_id.clone(),
        created_at: now,
    })?;
    tx.delete_marker(&PendingMarker::WalletTopUp(top_up))?;

    Ok(Transition::applied(Effect::WalletToppedUp {
        user_id: user.id,
        net_minor,
    })
    .notify(
        PushMessage::to_user(
            user.id,
            user.device_tokens,
            "Wallet topped up",
            format!("{:.2} was added to your wallet.", net_minor as f64 / 100.0),
        )
        .with_data("type", "top_up"),
    ))
}
