use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Instant;

use crate::error::AmortizationError;
use crate::rounding::{to_cents, zero_cents, CENT_DP, HALF_UP};
use crate::time_value::{level_payment, monthly_rate};
use crate::types::*;
use crate::AmortizationResult;

/// One row of an amortization schedule. Every monetary field has cent scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRecord {
    pub month: u32,
    pub remaining_balance: Money,
    pub payment: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub total_paid: Money,
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
}

/// Month-indexed schedule. Index 0 is the pre-disbursement state and the last
/// index is the terminal month with a zero balance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<MonthRecord>")]
pub struct Schedule {
    months: Vec<MonthRecord>,
}

impl TryFrom<Vec<MonthRecord>> for Schedule {
    type Error = AmortizationError;

    fn try_from(months: Vec<MonthRecord>) -> Result<Self, Self::Error> {
        if months.is_empty() {
            return Err(AmortizationError::invalid(
                "schedule",
                "A schedule must contain at least the opening month",
            ));
        }
        Ok(Schedule { months })
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.months.serialize(serializer)
    }
}

impl Schedule {
    pub fn term_months(&self) -> i32 {
        (self.months.len() - 1) as i32
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    /// Always false: construction rejects an empty month list.
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> &[MonthRecord] {
        &self.months
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonthRecord> {
        self.months.iter()
    }

    pub fn first(&self) -> &MonthRecord {
        &self.months[0]
    }

    pub fn last(&self) -> &MonthRecord {
        &self.months[self.months.len() - 1]
    }

    /// Look up a month, rejecting anything outside `0..=term_months`.
    pub fn month(&self, month: i64) -> AmortizationResult<&MonthRecord> {
        usize::try_from(month)
            .ok()
            .and_then(|idx| self.months.get(idx))
            .ok_or_else(|| AmortizationError::MonthOutOfRange {
                month,
                term_months: self.term_months(),
            })
    }

    /// The cent-quantized payment applied to every month except the last.
    pub fn level_payment(&self) -> Money {
        if self.months.len() > 2 {
            self.months[1].payment
        } else {
            self.last().payment
        }
    }

    pub fn final_payment(&self) -> Money {
        self.last().payment
    }

    pub fn into_months(self) -> Vec<MonthRecord> {
        self.months
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a MonthRecord;
    type IntoIter = std::slice::Iter<'a, MonthRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.months.iter()
    }
}

/// Full-precision state of one month before cent rounding.
#[derive(Debug, Clone)]
struct AccruedMonth {
    balance: Decimal,
    payment: Decimal,
    principal: Decimal,
    interest: Decimal,
    total_paid: Decimal,
    total_principal: Decimal,
    total_interest: Decimal,
}

impl AccruedMonth {
    fn opening(amount: Money) -> Self {
        AccruedMonth {
            balance: amount,
            payment: Decimal::ZERO,
            principal: Decimal::ZERO,
            interest: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_principal: Decimal::ZERO,
            total_interest: Decimal::ZERO,
        }
    }

    fn next(&self, payment: Money, rate: Rate, month: u32) -> AmortizationResult<Self> {
        let overflow = || AmortizationError::overflow(format!("month {month} accrual"));

        let interest = self.balance.checked_mul(rate).ok_or_else(overflow)?;
        let principal = payment.checked_sub(interest).ok_or_else(overflow)?;
        let balance = self.balance.checked_sub(principal).ok_or_else(overflow)?;

        Ok(AccruedMonth {
            balance,
            payment,
            principal,
            interest,
            total_paid: self.total_paid.checked_add(payment).ok_or_else(overflow)?,
            total_principal: self
                .total_principal
                .checked_add(principal)
                .ok_or_else(overflow)?,
            total_interest: self
                .total_interest
                .checked_add(interest)
                .ok_or_else(overflow)?,
        })
    }

    fn to_record(&self, month: u32) -> MonthRecord {
        MonthRecord {
            month,
            remaining_balance: to_cents(self.balance, HALF_UP),
            payment: to_cents(self.payment, HALF_UP),
            principal_paid: to_cents(self.principal, HALF_UP),
            interest_paid: to_cents(self.interest, HALF_UP),
            total_paid: to_cents(self.total_paid, HALF_UP),
            total_principal_paid: to_cents(self.total_principal, HALF_UP),
            total_interest_paid: to_cents(self.total_interest, HALF_UP),
        }
    }
}

fn opening_record(amount: Money) -> MonthRecord {
    let mut balance = amount;
    if balance.scale() < CENT_DP {
        balance.rescale(CENT_DP);
    }
    MonthRecord {
        month: 0,
        remaining_balance: balance,
        payment: zero_cents(),
        principal_paid: zero_cents(),
        interest_paid: zero_cents(),
        total_paid: zero_cents(),
        total_principal_paid: zero_cents(),
        total_interest_paid: zero_cents(),
    }
}

fn validate(amount: Money, term_months: i32, interest_rate: Rate) -> AmortizationResult<u32> {
    if amount <= Decimal::ZERO {
        return Err(AmortizationError::invalid(
            "amount",
            "Loan amount must be positive",
        ));
    }
    if term_months <= 0 {
        return Err(AmortizationError::invalid(
            "term_months",
            "Term must be at least 1 month",
        ));
    }
    if interest_rate < Decimal::ZERO {
        return Err(AmortizationError::invalid(
            "interest_rate",
            "Interest rate must be 0 or greater",
        ));
    }
    Ok(term_months as u32)
}

/// Generate the amortization schedule for a fixed-rate installment loan.
///
/// The level payment is quantized to whole cents, so iterating it against the
/// unrounded balance usually leaves a residual at the end of the term. That
/// residual (of either sign) is folded into the final month's payment, which
/// becomes a balloon payment when the loan amortizes negatively. Every field is
/// then rounded half-up to cents independently, and principal is re-derived
/// from the rounded payment and interest so that
/// `principal_paid + interest_paid == payment` holds exactly in every month.
///
/// Running totals are rounded from their own full-precision sums and are not
/// re-derived. In a month whose interest lands exactly on a half cent,
/// `total_principal_paid + total_interest_paid` can therefore differ from
/// `total_paid` by one cent.
pub fn generate(
    amount: Money,
    term_months: i32,
    interest_rate: Rate,
) -> AmortizationResult<Schedule> {
    let term = validate(amount, term_months, interest_rate)?;

    let rate = monthly_rate(interest_rate);
    let payment = to_cents(level_payment(amount, rate, term)?, HALF_UP);
    debug!(
        "amortizing {amount} over {term} months at monthly rate {rate}: level payment {payment}"
    );

    let mut accrued: Vec<AccruedMonth> = Vec::with_capacity(term as usize);
    let mut previous = AccruedMonth::opening(amount);
    for month in 1..=term {
        let current = previous.next(payment, rate, month)?;
        accrued.push(current.clone());
        previous = current;
    }

    // Balloon: push whatever balance is left into the final payment
    if let Some(last) = accrued.last_mut() {
        let discrepancy = last.balance;
        let overflow = || AmortizationError::overflow("balloon adjustment");
        last.balance = Decimal::ZERO;
        last.payment = last.payment.checked_add(discrepancy).ok_or_else(overflow)?;
        last.total_principal = last
            .total_principal
            .checked_add(discrepancy)
            .ok_or_else(overflow)?;
        last.total_paid = last.total_paid.checked_add(discrepancy).ok_or_else(overflow)?;
        debug!("final balance discrepancy {discrepancy} moved into month {term} payment");
    }

    let underwater = accrued
        .iter()
        .take(term as usize - 1)
        .filter(|m| m.principal <= Decimal::ZERO)
        .count();
    if underwater > 0 {
        warn!("level payment {payment} does not reduce principal in {underwater} of {term} months");
    }

    let mut months = Vec::with_capacity(term as usize + 1);
    months.push(opening_record(amount));
    months.extend(
        accrued
            .iter()
            .zip(1..=term)
            .map(|(m, month)| m.to_record(month)),
    );

    // Independent rounding can break payment = principal + interest. At the
    // terminal month the balloon makes that routine; earlier months only
    // diverge when interest lands exactly on a half cent.
    for m in months.iter_mut().skip(1) {
        m.principal_paid = m.payment - m.interest_paid;
    }

    Ok(Schedule { months })
}

// ---------------------------------------------------------------------------
// Serialisable request / response
// ---------------------------------------------------------------------------

/// Loan terms fed to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub amount: Money,
    pub term_months: i32,
    /// Nominal annual rate as a fraction (0.10 = 10%)
    pub interest_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub term_months: i32,
    pub monthly_rate: Rate,
    pub level_payment: Money,
    pub final_payment: Money,
    pub total_paid: Money,
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    /// Months in which the level payment did not reduce principal
    pub non_amortizing_months: u32,
    pub schedule: Schedule,
}

/// Build a schedule and wrap it with summary figures and metadata.
pub fn build_amortization_schedule(
    input: &AmortizationInput,
) -> AmortizationResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = generate(input.amount, input.term_months, input.interest_rate)?;
    let level = schedule.level_payment();
    let last = schedule.last().clone();

    let non_amortizing_months = schedule
        .iter()
        .skip(1)
        .take(schedule.len().saturating_sub(2))
        .filter(|m| m.principal_paid <= Decimal::ZERO)
        .count() as u32;

    if non_amortizing_months > 0 {
        warnings.push(format!(
            "Level payment of {level} does not reduce principal in {non_amortizing_months} \
             month(s); the final month carries a balloon payment of {}",
            last.payment
        ));
    }

    let output = AmortizationOutput {
        term_months: schedule.term_months(),
        monthly_rate: monthly_rate(input.interest_rate),
        level_payment: level,
        final_payment: last.payment,
        total_paid: last.total_paid,
        total_principal_paid: last.total_principal_paid,
        total_interest_paid: last.total_interest_paid,
        non_amortizing_months,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate annuity amortization (round half-up to cents, terminal balloon reconciliation)",
        &serde_json::json!({
            "amount": input.amount.to_string(),
            "term_months": input.term_months,
            "interest_rate": input.interest_rate.to_string(),
            "compounding": "monthly",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_length_and_endpoints() {
        let schedule = generate(dec!(1000.00), 12, dec!(0.10)).unwrap();
        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule.term_months(), 12);
        assert_eq!(schedule.first().remaining_balance, dec!(1000.00));
        assert_eq!(schedule.last().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_opening_month_has_no_flows() {
        let schedule = generate(dec!(1000), 12, dec!(0.10)).unwrap();
        let first = schedule.first();
        assert_eq!(first.month, 0);
        assert_eq!(first.remaining_balance.to_string(), "1000.00");
        assert_eq!(first.payment.to_string(), "0.00");
        assert_eq!(first.principal_paid, Decimal::ZERO);
        assert_eq!(first.interest_paid, Decimal::ZERO);
        assert_eq!(first.total_paid, Decimal::ZERO);
    }

    #[test]
    fn test_level_payment_constant_until_final_month() {
        let schedule = generate(dec!(1000), 12, dec!(0.10)).unwrap();
        for m in &schedule.months()[1..12] {
            assert_eq!(m.payment, dec!(87.92));
        }
        assert_eq!(schedule.level_payment(), dec!(87.92));
        assert_eq!(schedule.final_payment(), dec!(87.87));
    }

    #[test]
    fn test_final_month_identity_after_reconciliation() {
        let schedule = generate(dec!(1000.10), 12, dec!(0.10)).unwrap();
        let last = schedule.last();
        assert_eq!(last.principal_paid + last.interest_paid, last.payment);
    }

    #[test]
    fn test_half_cent_interest_keeps_payment_split() {
        // 1.00 at 0.5% monthly accrues exactly 0.005 in month 1
        let schedule = generate(dec!(1.00), 2, dec!(0.06)).unwrap();
        let m1 = schedule.month(1).unwrap();
        assert_eq!(m1.payment, dec!(0.50));
        assert_eq!(m1.interest_paid, dec!(0.01));
        assert_eq!(m1.principal_paid, dec!(0.49));
    }

    #[test]
    fn test_empty_schedule_rejected_on_deserialise() {
        assert!(serde_json::from_str::<Schedule>("[]").is_err());
    }

    #[test]
    fn test_schedule_deserialises_from_serialised_form() {
        let schedule = generate(dec!(1000.00), 12, dec!(0.10)).unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
        assert_eq!(back.term_months(), 12);
    }

    #[test]
    fn test_half_cent_month_totals_drift_by_one_cent() {
        let schedule = generate(dec!(1.00), 2, dec!(0.06)).unwrap();
        let m1 = schedule.month(1).unwrap();
        assert_eq!(m1.total_paid, dec!(0.50));
        assert_eq!(m1.total_principal_paid, dec!(0.50));
        assert_eq!(m1.total_interest_paid, dec!(0.01));
    }

    #[test]
    fn test_month_accessor_bounds() {
        let schedule = generate(dec!(1000), 12, dec!(0.10)).unwrap();
        assert_eq!(schedule.month(0).unwrap().month, 0);
        assert_eq!(schedule.month(12).unwrap().month, 12);
        assert!(matches!(
            schedule.month(13),
            Err(AmortizationError::MonthOutOfRange { month: 13, term_months: 12 })
        ));
        assert!(schedule.month(-1).is_err());
    }

    #[test]
    fn test_single_month_level_payment_is_the_only_payment() {
        let schedule = generate(dec!(1000), 1, dec!(0.10)).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.level_payment(), dec!(1008.33));
    }

    #[test]
    fn test_invalid_inputs() {
        for (amount, term, rate, field) in [
            (dec!(0), 12, dec!(0.1), "amount"),
            (dec!(-1), 12, dec!(0.1), "amount"),
            (dec!(1000), 0, dec!(0.1), "term_months"),
            (dec!(1000), -1, dec!(0.1), "term_months"),
            (dec!(1000), 12, dec!(-0.1), "interest_rate"),
        ] {
            match generate(amount, term, rate) {
                Err(AmortizationError::InvalidInput { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected InvalidInput for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_build_output_summary() {
        let input = AmortizationInput {
            amount: dec!(1000.00),
            term_months: 12,
            interest_rate: dec!(0.10),
        };
        let out = build_amortization_schedule(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.level_payment, dec!(87.92));
        assert_eq!(r.final_payment, dec!(87.87));
        assert_eq!(r.total_paid, dec!(1054.99));
        assert_eq!(r.total_interest_paid, dec!(54.99));
        assert_eq!(r.non_amortizing_months, 0);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_build_output_warns_on_balloon() {
        let input = AmortizationInput {
            amount: dec!(1000.00),
            term_months: 12,
            interest_rate: dec!(30.00),
        };
        let out = build_amortization_schedule(&input).unwrap();
        assert_eq!(out.result.non_amortizing_months, 11);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("3500.00"));
    }

    #[test]
    fn test_records_serialise_as_fixed_two_decimal_strings() {
        let schedule = generate(dec!(1000.00), 12, dec!(0.10)).unwrap();
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json[6]["remaining_balance"], "512.42");
        assert_eq!(json[6]["payment"], "87.92");
        assert_eq!(json[12]["remaining_balance"], "0.00");
        assert_eq!(json[0]["payment"], "0.00");
    }
}
