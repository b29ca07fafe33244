use napi::Result as NapiResult;
use napi_derive::napi;

use amortization_core::limits::LoanLimits;
use amortization_core::rounding::{to_cents, HALF_UP};
use amortization_core::schedule::amortization::{self, AmortizationInput};
use amortization_core::schedule::month::{self, LoanMonthInput};
use amortization_core::time_value;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Limits supplied by the caller, or the default 120-month term bound.
fn parse_limits(limits_json: Option<String>) -> NapiResult<LoanLimits> {
    match limits_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(LoanLimits::default()),
    }
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(
    input_json: String,
    limits_json: Option<String>,
) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    parse_limits(limits_json)?
        .check(input.amount, input.term_months, input.interest_rate)
        .map_err(to_napi_error)?;
    let output = amortization::build_amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_month(
    input_json: String,
    limits_json: Option<String>,
) -> NapiResult<String> {
    let input: LoanMonthInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    parse_limits(limits_json)?
        .check(input.amount, input.term_months, input.interest_rate)
        .map_err(to_napi_error)?;
    let output = month::loan_month(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn level_payment(input_json: String) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    LoanLimits::unbounded()
        .check(input.amount, input.term_months, input.interest_rate)
        .map_err(to_napi_error)?;
    let rate = time_value::monthly_rate(input.interest_rate);
    let payment = time_value::level_payment(input.amount, rate, input.term_months as u32)
        .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({
        "level_payment": to_cents(payment, HALF_UP).to_string(),
        "monthly_rate": rate.to_string(),
    }))
    .map_err(to_napi_error)
}
