pub mod boost_names;
pub mod boost_targets;
pub mod notification_kinds;
pub mod plan_names;
pub mod platforms;
pub mod revenue_kinds;
pub mod subscription_statuses;
pub mod user_roles;
pub mod wallet_transaction_kinds;
