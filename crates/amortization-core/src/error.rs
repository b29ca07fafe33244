use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmortizationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Month {month} is outside the schedule (valid months are 0..={term_months})")]
    MonthOutOfRange { month: i64, term_months: i32 },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AmortizationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AmortizationError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        AmortizationError::ArithmeticOverflow {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for AmortizationError {
    fn from(e: serde_json::Error) -> Self {
        AmortizationError::SerializationError(e.to_string())
    }
}
