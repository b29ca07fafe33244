pub mod error;
pub mod rounding;
pub mod time_value;
pub mod types;

pub mod schedule;

#[cfg(feature = "limits")]
pub mod limits;

pub use error::AmortizationError;
pub use schedule::amortization::{generate, MonthRecord, Schedule};
pub use types::*;

/// Standard result type for all amortization operations
pub type AmortizationResult<T> = Result<T, AmortizationError>;
