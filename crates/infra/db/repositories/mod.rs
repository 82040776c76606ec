pub mod entitlement_store;
pub mod entitlement_tx;
