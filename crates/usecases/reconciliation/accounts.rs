use super::{Effect, Transition};
use crate::domain::repositories::entitlement_store::{EntitlementTx, TxResult};

pub(super) fn clear_payment_method(
    tx: &mut dyn EntitlementTx,
    payment_method_id: &str,
) -> TxResult<Transition> {
    let users = tx.clear_stripe_payment_method(payment_method_id)?;
    Ok(Transition::applied(Effect::PaymentMethodCleared { users }))
}

pub(super) fn clear_customer(tx: &mut dyn EntitlementTx, customer_id: &str) -> TxResult<Transition> {
    let users = tx.clear_stripe_customer(customer_id)?;
    Ok(Transition::applied(Effect::CustomerCleared { users }))
}
