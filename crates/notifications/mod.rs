pub mod outbox;
pub mod push_gateway;
