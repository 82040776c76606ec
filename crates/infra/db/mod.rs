#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
pub mod postgres;
pub mod repositories;
