use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AmortizationError;
use crate::types::{Money, Rate};
use crate::AmortizationResult;

/// Longest term accepted when nothing else is configured.
pub const DEFAULT_MAX_TERM_MONTHS: i32 = 120;

pub const LENDING_MAX_AMOUNT: Money = dec!(100000);
pub const LENDING_MIN_INTEREST_RATE: Rate = dec!(0.06);
pub const LENDING_MAX_INTEREST_RATE: Rate = dec!(0.36);

/// Upper and lower bounds a caller applies before invoking the engine.
///
/// The engine only checks positivity. Every bound here is optional; an absent
/// bound is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanLimits {
    pub max_amount: Option<Money>,
    pub max_term_months: Option<i32>,
    pub min_interest_rate: Option<Rate>,
    pub max_interest_rate: Option<Rate>,
}

impl Default for LoanLimits {
    fn default() -> Self {
        LoanLimits::term_only(DEFAULT_MAX_TERM_MONTHS)
    }
}

impl LoanLimits {
    /// No bounds at all.
    pub fn unbounded() -> Self {
        LoanLimits {
            max_amount: None,
            max_term_months: None,
            min_interest_rate: None,
            max_interest_rate: None,
        }
    }

    pub fn term_only(max_term_months: i32) -> Self {
        LoanLimits {
            max_term_months: Some(max_term_months),
            ..LoanLimits::unbounded()
        }
    }

    /// Product limits for consumer installment loans: up to 100,000 over at
    /// most 120 months at a nominal rate between 6% and 36%.
    pub fn lending_defaults() -> Self {
        LoanLimits {
            max_amount: Some(LENDING_MAX_AMOUNT),
            max_term_months: Some(DEFAULT_MAX_TERM_MONTHS),
            min_interest_rate: Some(LENDING_MIN_INTEREST_RATE),
            max_interest_rate: Some(LENDING_MAX_INTEREST_RATE),
        }
    }

    pub fn check(
        &self,
        amount: Money,
        term_months: i32,
        interest_rate: Rate,
    ) -> AmortizationResult<()> {
        if amount <= Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "amount",
                format!("Invalid amount {amount}: must be positive"),
            ));
        }
        if let Some(max) = self.max_amount {
            if amount > max {
                return Err(AmortizationError::invalid(
                    "amount",
                    format!("Invalid amount {amount}: exceeds maximum {max}"),
                ));
            }
        }

        if term_months <= 0 {
            return Err(AmortizationError::invalid(
                "term_months",
                format!("Invalid term months {term_months}: must be at least 1"),
            ));
        }
        if let Some(max) = self.max_term_months {
            if term_months > max {
                return Err(AmortizationError::invalid(
                    "term_months",
                    format!("Invalid term months {term_months}: exceeds maximum {max}"),
                ));
            }
        }

        if interest_rate < Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "interest_rate",
                format!("Invalid interest rate {interest_rate}: must be 0 or greater"),
            ));
        }
        if let Some(min) = self.min_interest_rate {
            if interest_rate < min {
                return Err(AmortizationError::invalid(
                    "interest_rate",
                    format!("Invalid interest rate {interest_rate}: below minimum {min}"),
                ));
            }
        }
        if let Some(max) = self.max_interest_rate {
            if interest_rate > max {
                return Err(AmortizationError::invalid(
                    "interest_rate",
                    format!("Invalid interest rate {interest_rate}: above maximum {max}"),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_field(result: AmortizationResult<()>) -> String {
        match result {
            Err(AmortizationError::InvalidInput { field, .. }) => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_default_bounds_term_only() {
        let limits = LoanLimits::default();
        assert!(limits.check(dec!(5_000_000), 120, dec!(30)).is_ok());
        assert_eq!(rejected_field(limits.check(dec!(1000), 121, dec!(0.1))), "term_months");
    }

    #[test]
    fn test_lending_defaults() {
        let limits = LoanLimits::lending_defaults();
        assert!(limits.check(dec!(100000), 120, dec!(0.06)).is_ok());
        assert!(limits.check(dec!(1000), 12, dec!(0.36)).is_ok());
        assert_eq!(rejected_field(limits.check(dec!(100000.01), 12, dec!(0.1))), "amount");
        assert_eq!(rejected_field(limits.check(dec!(1000), 12, dec!(0.05))), "interest_rate");
        assert_eq!(rejected_field(limits.check(dec!(1000), 12, dec!(0.37))), "interest_rate");
    }

    #[test]
    fn test_unbounded_still_requires_positive_terms() {
        let limits = LoanLimits::unbounded();
        assert_eq!(rejected_field(limits.check(dec!(0), 12, dec!(0.1))), "amount");
        assert_eq!(rejected_field(limits.check(dec!(1000), 0, dec!(0.1))), "term_months");
        assert_eq!(rejected_field(limits.check(dec!(1000), 12, dec!(-0.01))), "interest_rate");
        assert!(limits.check(dec!(1000), 10_000, dec!(0.1)).is_ok());
    }

    #[test]
    fn test_partial_config_deserialises_with_defaults() {
        let limits: LoanLimits = serde_json::from_str(r#"{"max_amount": "50000"}"#).unwrap();
        assert_eq!(limits.max_amount, Some(dec!(50000)));
        assert_eq!(limits.max_term_months, Some(DEFAULT_MAX_TERM_MONTHS));
        assert_eq!(limits.min_interest_rate, None);
    }
}
