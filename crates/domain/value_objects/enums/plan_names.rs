use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlanName {
    #[default]
    NoPlan,
    FreePlan,
    Basic,
    Standard,
    Premium,
}

impl PlanName {
    pub const PAID: [PlanName; 3] = [PlanName::Basic, PlanName::Standard, PlanName::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::NoPlan => "No Plan",
            PlanName::FreePlan => "Free Plan",
            PlanName::Basic => "Basic",
            PlanName::Standard => "Standard",
            PlanName::Premium => "Premium",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PlanName::Basic | PlanName::Standard | PlanName::Premium)
    }

    /// Resolves a store SKU, product id or price lookup key (`com.app.premium_monthly`,
    /// `standard-plan`, `Basic`) to a paid plan. Unknown identifiers resolve to `None`.
    pub fn from_provider_sku(sku: &str) -> Option<PlanName> {
        let normalized = sku.to_ascii_lowercase();
        if normalized.contains("premium") {
            Some(PlanName::Premium)
        } else if normalized.contains("standard") {
            Some(PlanName::Standard)
        } else if normalized.contains("basic") {
            Some(PlanName::Basic)
        } else {
            None
        }
    }
}

impl Display for PlanName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "No Plan" => Ok(PlanName::NoPlan),
            "Free Plan" => Ok(PlanName::FreePlan),
            "Basic" => Ok(PlanName::Basic),
            "Standard" => Ok(PlanName::Standard),
            "Premium" => Ok(PlanName::Premium),
            other => Err(format!("Unsupported plan name: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_provider_skus_case_insensitively() {
        assert_eq!(
            PlanName::from_provider_sku("com.market.Premium_Monthly"),
            Some(PlanName::Premium)
        );
        assert_eq!(
            PlanName::from_provider_sku("standard-plan"),
            Some(PlanName::Standard)
        );
        assert_eq!(PlanName::from_provider_sku("BASIC"), Some(PlanName::Basic));
        assert_eq!(PlanName::from_provider_sku("gold_plan"), None);
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for plan in [
            PlanName::NoPlan,
            PlanName::FreePlan,
            PlanName::Basic,
            PlanName::Standard,
            PlanName::Premium,
        ] {
            assert_eq!(plan.to_string().parse::<PlanName>(), Ok(plan));
        }
    }
}
