use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use amortization_core::limits::LoanLimits;
use amortization_core::rounding::{to_cents, HALF_UP};
use amortization_core::schedule::amortization::{self, AmortizationInput};
use amortization_core::schedule::month::{self, LoanMonthInput};
use amortization_core::time_value;

use crate::input;

/// Loan terms shared by every subcommand
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<i32>,

    /// Nominal annual interest rate as a decimal (0.10 = 10%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,
}

/// Arguments for the full schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

/// Arguments for a single month lookup
#[derive(Args)]
pub struct MonthArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Month index (0 is the pre-disbursement month)
    #[arg(long)]
    pub month: Option<i64>,
}

/// Arguments for the level payment
#[derive(Args)]
pub struct PaymentArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

fn loan_input(args: &LoanArgs) -> Result<AmortizationInput, Box<dyn std::error::Error>> {
    let loan: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(loan) = input::stdin::read_stdin()? {
        loan
    } else {
        AmortizationInput {
            amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            interest_rate: args
                .interest_rate
                .ok_or("--interest-rate is required (or provide --input)")?,
        }
    };
    Ok(loan)
}

fn check_limits(
    loan: &AmortizationInput,
    limits: &LoanLimits,
) -> Result<(), Box<dyn std::error::Error>> {
    limits.check(loan.amount, loan.term_months, loan.interest_rate)?;
    Ok(())
}

pub fn run_schedule(
    args: ScheduleArgs,
    limits: &LoanLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = loan_input(&args.loan)?;
    check_limits(&loan, limits)?;
    let result = amortization::build_amortization_schedule(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_month(
    args: MonthArgs,
    limits: &LoanLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let month_input: LoanMonthInput = if let Some(ref path) = args.loan.input {
        let mut value = input::file::read_json_value(path)?;
        if let (Some(month), Some(obj)) = (args.month, value.as_object_mut()) {
            obj.insert("month".into(), Value::from(month));
        }
        serde_json::from_value(value)?
    } else {
        let loan = loan_input(&args.loan)?;
        LoanMonthInput {
            amount: loan.amount,
            term_months: loan.term_months,
            interest_rate: loan.interest_rate,
            month: args.month.ok_or("--month is required")?,
        }
    };
    limits.check(
        month_input.amount,
        month_input.term_months,
        month_input.interest_rate,
    )?;
    let result = month::loan_month(&month_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payment(
    args: PaymentArgs,
    limits: &LoanLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = loan_input(&args.loan)?;
    check_limits(&loan, limits)?;

    let rate = time_value::monthly_rate(loan.interest_rate);
    let payment = time_value::level_payment(loan.amount, rate, loan.term_months as u32)?;

    Ok(serde_json::json!({
        "level_payment": to_cents(payment, HALF_UP).to_string(),
        "monthly_rate": rate.to_string(),
        "term_months": loan.term_months,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amortization_core::AmortizationError;
    use rust_decimal_macros::dec;

    fn input_file(name: &str, json: &str) -> LoanArgs {
        let path =
            std::env::temp_dir().join(format!("amort-cmd-{}-{}", std::process::id(), name));
        std::fs::write(&path, json).unwrap();
        LoanArgs {
            input: Some(path.to_string_lossy().into_owned()),
            amount: None,
            term_months: None,
            interest_rate: None,
        }
    }

    const TEN_PERCENT: &str =
        r#"{"amount": "1000.00", "term_months": 12, "interest_rate": "0.10"}"#;

    #[test]
    fn test_run_schedule_from_file() {
        let args = ScheduleArgs {
            loan: input_file("schedule.json", TEN_PERCENT),
        };
        let value = run_schedule(args, &LoanLimits::default()).unwrap();
        assert_eq!(value["result"]["level_payment"], "87.92");
        assert_eq!(value["result"]["schedule"][12]["total_paid"], "1054.99");
    }

    #[test]
    fn test_run_month_flag_overrides_file() {
        let args = MonthArgs {
            loan: input_file("month.json", TEN_PERCENT),
            month: Some(6),
        };
        let value = run_month(args, &LoanLimits::default()).unwrap();
        assert_eq!(value["result"]["principal_balance"], "512.42");
    }

    #[test]
    fn test_run_payment() {
        let args = PaymentArgs {
            loan: input_file("payment.json", TEN_PERCENT),
        };
        let value = run_payment(args, &LoanLimits::default()).unwrap();
        assert_eq!(value["level_payment"], "87.92");
    }

    #[test]
    fn test_term_limit_enforced_before_engine() {
        let args = ScheduleArgs {
            loan: input_file(
                "long.json",
                r#"{"amount": "1000.00", "term_months": 121, "interest_rate": "0.10"}"#,
            ),
        };
        let err = run_schedule(args, &LoanLimits::default()).unwrap_err();
        let err = err.downcast::<AmortizationError>().unwrap();
        assert!(matches!(
            *err,
            AmortizationError::InvalidInput { ref field, .. } if field == "term_months"
        ));
    }

    #[test]
    fn test_lending_limits_reject_high_rate() {
        let args = PaymentArgs {
            loan: input_file(
                "usury.json",
                r#"{"amount": "1000.00", "term_months": 12, "interest_rate": "30.00"}"#,
            ),
        };
        assert!(run_payment(args, &LoanLimits::lending_defaults()).is_err());
        assert_eq!(LoanLimits::lending_defaults().max_amount, Some(dec!(100000)));
    }
}
