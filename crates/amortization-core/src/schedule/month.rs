use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::schedule::amortization::{generate, MonthRecord};
use crate::types::*;
use crate::AmortizationResult;

/// Loan terms plus the month to inspect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanMonthInput {
    pub amount: Money,
    pub term_months: i32,
    pub interest_rate: Rate,
    pub month: i64,
}

/// Balance and payment split for a single month of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBreakdown {
    pub month: u32,
    pub principal_balance: Money,
    pub payment: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub is_final_month: bool,
}

impl MonthBreakdown {
    fn from_record(record: &MonthRecord, term_months: i32) -> Self {
        MonthBreakdown {
            month: record.month,
            principal_balance: record.remaining_balance,
            payment: record.payment,
            principal_paid: record.principal_paid,
            interest_paid: record.interest_paid,
            is_final_month: record.month as i64 == term_months as i64,
        }
    }
}

/// Recompute the schedule and return the requested month.
pub fn loan_month(input: &LoanMonthInput) -> AmortizationResult<ComputationOutput<MonthBreakdown>> {
    let start = Instant::now();

    let schedule = generate(input.amount, input.term_months, input.interest_rate)?;
    let record = schedule.month(input.month)?;
    let breakdown = MonthBreakdown::from_record(record, schedule.term_months());

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single month lookup on a fixed-rate amortization schedule",
        &serde_json::json!({
            "amount": input.amount.to_string(),
            "term_months": input.term_months,
            "interest_rate": input.interest_rate.to_string(),
            "month": input.month,
        }),
        Vec::new(),
        elapsed,
        breakdown,
    ))
}
