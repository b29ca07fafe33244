use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Money;

/// Number of fractional digits carried by every finalized monetary value.
pub const CENT_DP: u32 = 2;

/// Round-half-up: ties move away from zero (0.125 -> 0.13, -0.125 -> -0.13).
pub const HALF_UP: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Round `value` to whole cents using `strategy` and pin the scale at two
/// digits, so `1000` becomes `1000.00` and serialises as such.
pub fn to_cents(value: Decimal, strategy: RoundingStrategy) -> Money {
    let mut rounded = value.round_dp_with_strategy(CENT_DP, strategy);
    rounded.rescale(CENT_DP);
    if rounded.is_zero() {
        // -0.004 must not print as "-0.00"
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Zero with cent scale (`0.00`).
pub fn zero_cents() -> Money {
    Decimal::new(0, CENT_DP)
}
