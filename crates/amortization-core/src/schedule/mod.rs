pub mod amortization;
pub mod month;
