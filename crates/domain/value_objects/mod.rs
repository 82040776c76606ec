pub mod canonical_events;
pub mod enums;
pub mod fees;
pub mod plans;
