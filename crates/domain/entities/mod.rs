pub mod ledger;
pub mod listings;
pub mod markers;
pub mod notifications;
pub mod orders;
pub mod users;
