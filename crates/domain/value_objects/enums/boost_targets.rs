use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::revenue_kinds::RevenueKind;

/// Kind of listing a boost can be attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BoostTarget {
    Product,
    Service,
}

impl BoostTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostTarget::Product => "product",
            BoostTarget::Service => "service",
        }
    }

    pub fn revenue_kind(&self) -> RevenueKind {
        match self {
            BoostTarget::Product => RevenueKind::Product,
            BoostTarget::Service => RevenueKind::Service,
        }
    }
}

impl Display for BoostTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoostTarget {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "product" => Ok(BoostTarget::Product),
            "service" => Ok(BoostTarget::Service),
            other => Err(format!("Unsupported boost target: {}", other)),
        }
    }
}
