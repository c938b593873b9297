use crate::error::{LiquidityError, Result};
use crate::math::checked::{Rounding, checked_add, checked_sub, mul_div};
use crate::math::fraction::Fraction;
use primitive_types::{U256, U512};

/// Calculates the gross target amount received for a given source amount
/// on the constant product curve (x * y = k), before any fee.
///
/// formula: dy = y * dx / (x + dx), rounded down
pub fn target_amount_by_source(
    source_balance: U256,
    target_balance: U256,
    source_amount: U256,
) -> Result<U256> {
    if source_balance.is_zero() || target_balance.is_zero() {
        return Err(LiquidityError::InsufficientLiquidity);
    }
    let denominator = checked_add(source_balance, source_amount)?;
    mul_div(target_balance, source_amount, denominator, Rounding::Down)
}

/// Calculates the source amount required to take a gross target amount
/// out of the curve.
///
/// formula: dx = x * dy / (y - dy), rounded up
pub fn source_amount_by_target(
    source_balance: U256,
    target_balance: U256,
    target_amount: U256,
) -> Result<U256> {
    if source_balance.is_zero() || target_balance.is_zero() {
        return Err(LiquidityError::InsufficientLiquidity);
    }
    if target_amount >= target_balance {
        return Err(LiquidityError::InsufficientLiquidity);
    }
    let remaining = checked_sub(target_balance, target_amount)?;
    mul_div(source_balance, target_amount, remaining, Rounding::Up)
}

/// Calculates the constant product K without overflow.
pub fn calculate_k(balance0: U256, balance1: U256) -> U512 {
    balance0.full_mul(balance1)
}

/// Spot rate of the base token in network tokens (`network / base`).
pub fn spot_rate(base_balance: U256, network_balance: U256) -> Result<Fraction> {
    Fraction::new(network_balance, base_balance)
}
