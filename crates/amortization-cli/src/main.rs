mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use amortization_core::limits::{LoanLimits, DEFAULT_MAX_TERM_MONTHS};

use commands::schedule::{MonthArgs, PaymentArgs, ScheduleArgs};

/// Fixed-rate installment loan amortization
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Fixed-rate installment loan amortization schedules",
    long_about = "Computes month-by-month amortization schedules for fixed-rate installment \
                  loans with decimal precision: remaining balance, payment, principal and \
                  interest paid, and running totals, with a terminal balloon correction."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Reject loans with a longer term than this
    #[arg(long, default_value_t = DEFAULT_MAX_TERM_MONTHS, global = true)]
    max_term_months: i32,

    /// Apply consumer lending limits (amount <= 100000, 6% <= rate <= 36%)
    #[arg(long, global = true)]
    lending_limits: bool,

    /// Path to a JSON or YAML loan limits file (overrides the other limit flags)
    #[arg(long, global = true)]
    limits: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full amortization schedule
    Schedule(ScheduleArgs),
    /// Show balance and payment split for a single month
    Month(MonthArgs),
    /// Show only the level monthly payment
    Payment(PaymentArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn resolve_limits(cli: &Cli) -> Result<LoanLimits, Box<dyn std::error::Error>> {
    if let Some(ref path) = cli.limits {
        return input::file::read_config(path);
    }
    if cli.lending_limits {
        return Ok(LoanLimits {
            max_term_months: Some(cli.max_term_months),
            ..LoanLimits::lending_defaults()
        });
    }
    Ok(LoanLimits::term_only(cli.max_term_months))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let limits = match resolve_limits(&cli) {
        Ok(limits) => limits,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    log::debug!("loan limits: {limits:?}");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &limits),
        Commands::Month(args) => commands::schedule::run_month(args, &limits),
        Commands::Payment(args) => commands::schedule::run_payment(args, &limits),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
