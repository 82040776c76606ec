use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BoostName {
    #[default]
    NoPlan,
    QuickStart,
    ExtendedExposure,
    MaximumImpact,
}

impl BoostName {
    pub const PAID: [BoostName; 3] = [
        BoostName::QuickStart,
        BoostName::ExtendedExposure,
        BoostName::MaximumImpact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoostName::NoPlan => "No Plan",
            BoostName::QuickStart => "Quick Start",
            BoostName::ExtendedExposure => "Extended Exposure",
            BoostName::MaximumImpact => "Maximum Impact",
        }
    }
}

impl Display for BoostName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoostName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "No Plan" => Ok(BoostName::NoPlan),
            "Quick Start" => Ok(BoostName::QuickStart),
            "Extended Exposure" => Ok(BoostName::ExtendedExposure),
            "Maximum Impact" => Ok(BoostName::MaximumImpact),
            other => Err(format!("Unsupported boost name: {}", other)),
        }
    }
}
