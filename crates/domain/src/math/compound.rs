//! Compounding of a scaled multiplier over discrete periods.

use crate::error::Result;
use crate::math::checked::Rounding;
use crate::math::fraction::Fraction;
use primitive_types::U256;

/// Fixed-point scale of growth factors: `1.0 == 10^18`.
pub const GROWTH_FACTOR_SCALE: u64 = 1_000_000_000_000_000_000;

/// Returns `value * (1 + rate)^periods`, rounded down and capped at `cap`.
///
/// The result never drops below `value`: a non-negative rate gives a
/// per-period factor of at least one, floor rounding of a product with a
/// factor of at least one never undershoots the input, and narrowing keeps
/// the factor on the same side of one. A `value` already above `cap` is
/// returned unchanged.
pub fn compound(value: U256, rate: &Fraction, periods: u64, cap: U256) -> Result<U256> {
    if value >= cap || periods == 0 || rate.is_zero() || value.is_zero() {
        return Ok(value);
    }

    let mut base = Fraction::new(
        rate.d()
            .checked_add(rate.n())
            .ok_or(crate::error::LiquidityError::Overflow("growth rate"))?,
        rate.d(),
    )?;
    let mut result = value;
    let mut remaining = periods;

    while remaining > 0 {
        if remaining & 1 == 1 {
            result = match base.mul_amount(result, Rounding::Down) {
                Ok(next) => next,
                Err(_) => return Ok(cap),
            };
            if result >= cap {
                return Ok(cap);
            }
        }
        remaining >>= 1;
        if remaining > 0 {
            base = match base.checked_mul(&base) {
                Ok(squared) => squared,
                // a factor past 2^256 saturates anything non-zero
                Err(_) => return Ok(cap),
            };
        }
    }

    Ok(result)
}
