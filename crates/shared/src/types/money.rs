//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Balances and amounts are `rust_decimal::Decimal` stored as `NUMERIC(12, 2)`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Total number of digits a stored amount may carry.
pub const MONEY_PRECISION: u32 = 12;

/// Rounds a value to the money scale using banker's rounding.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns `part` as a percentage of `total`, rounded to the money scale.
///
/// A zero total yields zero.
#[must_use]
pub fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    round_money(part * Decimal::ONE_HUNDRED / total)
}

/// Returns true if `value` fits a `NUMERIC(12, 2)` column without rounding.
#[must_use]
pub fn fits_money_column(value: Decimal) -> bool {
    let integer_digits = value.abs().trunc().to_string().trim_start_matches('0').len();
    let max_integer_digits = (MONEY_PRECISION - MONEY_SCALE) as usize;
    value.normalize().scale() <= MONEY_SCALE && integer_digits <= max_integer_digits
}
