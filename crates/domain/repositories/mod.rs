pub mod entitlement_store;
pub mod notification_gateway;
pub mod payment_gateways;
