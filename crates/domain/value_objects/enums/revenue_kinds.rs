use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RevenueKind {
    Subscription,
    Product,
    Service,
}

impl RevenueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueKind::Subscription => "subscription",
            RevenueKind::Product => "product",
            RevenueKind::Service => "service",
        }
    }
}

impl Display for RevenueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevenueKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "subscription" => Ok(RevenueKind::Subscription),
            "product" => Ok(RevenueKind::Product),
            "service" => Ok(RevenueKind::Service),
            other => Err(format!("Unsupported revenue kind: {}", other)),
        }
    }
}
