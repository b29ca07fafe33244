use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::AmortizationError;
use crate::types::{Money, Rate};
use crate::AmortizationResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Nominal annual rate to periodic monthly rate. Carried at full precision.
pub fn monthly_rate(annual_rate: Rate) -> Rate {
    annual_rate / MONTHS_PER_YEAR
}

/// Unrounded level payment that retires `amount` over `term_months` periods.
///
/// Standard annuity formula `P * r(1+r)^n / ((1+r)^n - 1)`. A zero rate makes
/// the denominator vanish, in which case the payment is straight-line
/// `P / n`. When `(1+r)^n` is beyond the decimal range the ratio
/// `(1+r)^n / ((1+r)^n - 1)` is indistinguishable from one, so the payment
/// collapses to the interest-only amount `P * r`.
pub fn level_payment(amount: Money, rate: Rate, term_months: u32) -> AmortizationResult<Money> {
    if term_months == 0 {
        return Err(AmortizationError::InvalidInput {
            field: "term_months".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    let straight_line = || amount / Decimal::from(term_months);

    if rate.is_zero() {
        return Ok(straight_line());
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = match one_plus_r.checked_powi(i64::from(term_months)) {
        Some(f) => f,
        None => {
            return amount
                .checked_mul(rate)
                .ok_or_else(|| AmortizationError::overflow("interest-only payment"));
        }
    };

    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        // rate too small to register over the term
        return Ok(straight_line());
    }

    let annuity_factor = rate
        .checked_mul(factor)
        .and_then(|numerator| numerator.checked_div(denominator))
        .ok_or_else(|| AmortizationError::overflow("annuity factor"))?;

    amount
        .checked_mul(annuity_factor)
        .ok_or_else(|| AmortizationError::overflow("level payment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::{to_cents, HALF_UP};

    #[test]
    fn test_monthly_rate_is_unrounded() {
        let r = monthly_rate(dec!(0.10));
        assert!(r > dec!(0.0083333333333333));
        assert!(r < dec!(0.0083333333333334));
        assert_eq!(monthly_rate(dec!(30)), dec!(2.5));
    }

    #[test]
    fn test_level_payment_ten_percent() {
        let pmt = level_payment(dec!(1000), monthly_rate(dec!(0.10)), 12).unwrap();
        // 1000 * r(1+r)^12 / ((1+r)^12 - 1) ≈ 87.9159
        assert_eq!(to_cents(pmt, HALF_UP), dec!(87.92));
    }

    #[test]
    fn test_level_payment_zero_rate_is_straight_line() {
        let pmt = level_payment(dec!(1000), Decimal::ZERO, 12).unwrap();
        assert_eq!(to_cents(pmt, HALF_UP), dec!(83.33));
    }

    #[test]
    fn test_level_payment_single_period() {
        let pmt = level_payment(dec!(1000), monthly_rate(dec!(0.10)), 1).unwrap();
        assert_eq!(to_cents(pmt, HALF_UP), dec!(1008.33));
    }

    #[test]
    fn test_level_payment_huge_rate() {
        // 3.5^12 is large enough that the payment is barely above interest
        let pmt = level_payment(dec!(1000), dec!(2.5), 12).unwrap();
        assert_eq!(to_cents(pmt, HALF_UP), dec!(2500.00));
    }

    #[test]
    fn test_level_payment_factor_overflow_falls_back_to_interest_only() {
        // 3.5^120 does not fit in 96 bits
        let pmt = level_payment(dec!(1000), dec!(2.5), 120).unwrap();
        assert_eq!(pmt, dec!(2500));
    }

    #[test]
    fn test_level_payment_zero_periods() {
        assert!(level_payment(dec!(1000), dec!(0.01), 0).is_err());
    }
}
