use chrono::Duration;
use serde::Serialize;

use super::enums::{boost_names::BoostName, plan_names::PlanName};

/// What a subscription plan grants its holder. Prices are in minor units.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanBenefits {
    pub price_minor: i64,
    pub available_postings: i32,
    pub available_boosts: i32,
    pub wishlist_feature: bool,
}

/// Price and exposure window of a listing boost.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BoostTier {
    pub price_minor: i64,
    pub duration_days: i64,
}

pub const FREE_PLAN_BENEFITS: PlanBenefits = PlanBenefits {
    price_minor: 0,
    available_postings: 1,
    available_boosts: 0,
    wishlist_feature: false,
};

const BASIC_BENEFITS: PlanBenefits = PlanBenefits {
    price_minor: 299,
    available_postings: 2,
    available_boosts: 1,
    wishlist_feature: false,
};

const STANDARD_BENEFITS: PlanBenefits = PlanBenefits {
    price_minor: 599,
    available_postings: 5,
    available_boosts: 3,
    wishlist_feature: false,
};

const PREMIUM_BENEFITS: PlanBenefits = PlanBenefits {
    price_minor: 999,
    available_postings: 10000,
    available_boosts: 6,
    wishlist_feature: true,
};

impl PlanName {
    /// Benefit table shared by every payment platform. `No Plan` grants nothing.
    pub fn benefits(&self) -> Option<PlanBenefits> {
        match self {
            PlanName::NoPlan => None,
            PlanName::FreePlan => Some(FREE_PLAN_BENEFITS),
            PlanName::Basic => Some(BASIC_BENEFITS),
            PlanName::Standard => Some(STANDARD_BENEFITS),
            PlanName::Premium => Some(PREMIUM_BENEFITS),
        }
    }
}

impl BoostName {
    pub fn tier(&self) -> Option<BoostTier> {
        match self {
            BoostName::NoPlan => None,
            BoostName::QuickStart => Some(BoostTier {
                price_minor: 2899,
                duration_days: 7,
            }),
            BoostName::ExtendedExposure => Some(BoostTier {
                price_minor: 4399,
                duration_days: 14,
            }),
            BoostName::MaximumImpact => Some(BoostTier {
                price_minor: 8499,
                duration_days: 30,
            }),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.tier().map(|tier| Duration::days(tier.duration_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_plans_match_benefit_table() {
        let expected = [
            (PlanName::Basic, 299, 2, 1, false),
            (PlanName::Standard, 599, 5, 3, false),
            (PlanName::Premium, 999, 10000, 6, true),
        ];

        for (plan, price, postings, boosts, wishlist) in expected {
            let benefits = plan.benefits().unwrap();
            assert_eq!(benefits.price_minor, price, "{plan}");
            assert_eq!(benefits.available_postings, postings, "{plan}");
            assert_eq!(benefits.available_boosts, boosts, "{plan}");
            assert_eq!(benefits.wishlist_feature, wishlist, "{plan}");
        }
    }

    #[test]
    fn free_plan_grants_a_single_posting() {
        let benefits = PlanName::FreePlan.benefits().unwrap();
        assert_eq!(benefits, FREE_PLAN_BENEFITS);
        assert!(PlanName::NoPlan.benefits().is_none());
    }

    #[test]
    fn boost_tiers_match_price_and_duration_table() {
        assert_eq!(BoostName::QuickStart.duration(), Some(Duration::days(7)));
        assert_eq!(BoostName::ExtendedExposure.duration(), Some(Duration::days(14)));
        assert_eq!(BoostName::MaximumImpact.duration(), Some(Duration::days(30)));
        assert_eq!(BoostName::QuickStart.tier().unwrap().price_minor, 2899);
        assert_eq!(BoostName::ExtendedExposure.tier().unwrap().price_minor, 4399);
        assert_eq!(BoostName::MaximumImpact.tier().unwrap().price_minor, 8499);
        assert!(BoostName::NoPlan.tier().is_none());
    }
}
