use anyhow::{Context, Result, bail};

const BPS_SCALE: i64 = 10_000;

/// Platform commission and payment-provider fee model, in basis points and minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub platform_fee_bps: i64,
    pub provider_fee_bps: i64,
    pub provider_fixed_fee_minor: i64,
}

impl FeeSchedule {
    /// Amount owed to a seller for `gross_minor` of sales: `gross * (1 - platformFee)`,
    /// rounded down to the cent.
    pub fn seller_transfer(&self, gross_minor: i64) -> i64 {
        gross_minor * (BPS_SCALE - self.platform_fee_bps) / BPS_SCALE
    }

    /// Wallet credit for a top-up: `gross - (gross * feePercentage + fixedFee)`.
    pub fn top_up_net(&self, gross_minor: i64) -> i64 {
        let percentage_fee = (gross_minor * self.provider_fee_bps + BPS_SCALE / 2) / BPS_SCALE;
        gross_minor - (percentage_fee + self.provider_fixed_fee_minor)
    }
}

/// Parses a fraction such as `0.1` or `0.029` into basis points.
pub fn fraction_to_bps(raw: &str) -> Result<i64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid fee fraction: {raw}"))?;
    if !(0.0..1.0).contains(&value) {
        bail!("fee fraction must be within [0, 1): {raw}");
    }
    Ok((value * BPS_SCALE as f64).round() as i64)
}

/// Parses a decimal amount such as `0.30` into minor units.
pub fn decimal_to_minor(raw: &str) -> Result<i64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid decimal amount: {raw}"))?;
    if value < 0.0 {
        bail!("amount must not be negative: {raw}");
    }
    Ok((value * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            platform_fee_bps: 1000,
            provider_fee_bps: 290,
            provider_fixed_fee_minor: 30,
        }
    }

    #[test]
    fn seller_transfer_keeps_ninety_percent() {
        assert_eq!(schedule().seller_transfer(1000), 900);
        assert_eq!(schedule().seller_transfer(4000), 3600);
        assert_eq!(schedule().seller_transfer(999), 899);
    }

    #[test]
    fn top_up_net_subtracts_percentage_and_fixed_fee() {
        // 100.00 - (2.90 + 0.30)
        assert_eq!(schedule().top_up_net(10_000), 9_680);
    }

    #[test]
    fn parses_fractions_and_amounts() {
        assert_eq!(fraction_to_bps("0.1").unwrap(), 1000);
        assert_eq!(fraction_to_bps("0.029").unwrap(), 290);
        assert!(fraction_to_bps("1.5").is_err());
        assert_eq!(decimal_to_minor("0.30").unwrap(), 30);
        assert!(decimal_to_minor("-1").is_err());
    }
}
