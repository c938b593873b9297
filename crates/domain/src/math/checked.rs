//! Overflow-checked integer helpers over `U256`.
//!
//! All amount math in the engine funnels through these functions so that
//! overflow, underflow and division by zero become typed errors instead of
//! panics, and every division states its rounding direction.
//!
//! Convention: the protocol favours itself. Amounts paid out round
//! [`Rounding::Down`], amounts charged round [`Rounding::Up`].

use crate::error::{LiquidityError, Result};
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

/// Parts-per-million resolution used by fees, weights and tolerances.
pub const PPM_RESOLUTION: u32 = 1_000_000;

/// Direction of integer division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    /// Floor division, used for amounts paid out.
    Down,
    /// Ceiling division, used for amounts charged.
    Up,
}

pub fn checked_add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b)
        .ok_or(LiquidityError::Overflow("amount addition overflow"))
}

pub fn checked_sub(a: U256, b: U256) -> Result<U256> {
    a.checked_sub(b)
        .ok_or(LiquidityError::Underflow("amount subtraction underflow"))
}

pub fn checked_mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b)
        .ok_or(LiquidityError::Overflow("amount multiplication overflow"))
}

/// Divides a 512-bit numerator with the given rounding.
pub fn div_round_wide(numerator: U512, denominator: U512, rounding: Rounding) -> Result<U512> {
    if denominator.is_zero() {
        return Err(LiquidityError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    match rounding {
        Rounding::Down => Ok(quotient),
        Rounding::Up => {
            if (numerator % denominator).is_zero() {
                Ok(quotient)
            } else {
                // numerator fits in 512 bits and denominator >= 1, so quotient < U512::MAX
                Ok(quotient + U512::one())
            }
        }
    }
}

/// Narrows a 512-bit intermediate back to `U256`.
pub fn narrow(value: U512) -> Result<U256> {
    U256::try_from(value).map_err(|_| LiquidityError::Overflow("result exceeds 256 bits"))
}

/// Computes `a * b / c` with a 512-bit intermediate product.
///
/// # Errors
///
/// [`LiquidityError::DivisionByZero`] when `c` is zero and
/// [`LiquidityError::Overflow`] when the quotient does not fit in 256 bits.
pub fn mul_div(a: U256, b: U256, c: U256, rounding: Rounding) -> Result<U256> {
    if c.is_zero() {
        return Err(LiquidityError::DivisionByZero);
    }
    let product = a.full_mul(b);
    narrow(div_round_wide(product, U512::from(c), rounding)?)
}

/// Applies a parts-per-million portion to an amount.
pub fn mul_ppm(amount: U256, ppm: u32, rounding: Rounding) -> Result<U256> {
    mul_div(
        amount,
        U256::from(ppm),
        U256::from(PPM_RESOLUTION),
        rounding,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding_directions() {
        let a = U256::from(10u64);
        let b = U256::from(1u64);
        let c = U256::from(3u64);
        assert_eq!(mul_div(a, b, c, Rounding::Down).unwrap(), U256::from(3u64));
        assert_eq!(mul_div(a, b, c, Rounding::Up).unwrap(), U256::from(4u64));

        // exact division agrees in both directions
        let c = U256::from(5u64);
        assert_eq!(mul_div(a, b, c, Rounding::Up).unwrap(), U256::from(2u64));
    }

    #[test]
    fn test_mul_div_uses_wide_intermediate() {
        // MAX * MAX / MAX would overflow a 256-bit product
        let result = mul_div(U256::MAX, U256::MAX, U256::MAX, Rounding::Down).unwrap();
        assert_eq!(result, U256::MAX);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div(U256::one(), U256::one(), U256::zero(), Rounding::Down),
            Err(LiquidityError::DivisionByZero)
        );
        assert_eq!(
            mul_div(U256::MAX, U256::from(2u64), U256::one(), Rounding::Down),
            Err(LiquidityError::Overflow("result exceeds 256 bits"))
        );
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert_eq!(
            checked_sub(U256::one(), U256::from(2u64)),
            Err(LiquidityError::Underflow("amount subtraction underflow"))
        );
    }

    #[test]
    fn test_mul_ppm() {
        let amount = U256::from(1_000_001u64);
        // 0.3% of 1_000_001 = 3000.003
        assert_eq!(
            mul_ppm(amount, 3_000, Rounding::Down).unwrap(),
            U256::from(3_000u64)
        );
        assert_eq!(
            mul_ppm(amount, 3_000, Rounding::Up).unwrap(),
            U256::from(3_001u64)
        );
    }
}
