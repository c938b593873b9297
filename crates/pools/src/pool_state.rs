//! Per-pool ledger.

use lnet_domain::error::{LiquidityError, Result};
use lnet_domain::math::constant_product::spot_rate;
use lnet_domain::math::{Fraction, Rounding, mul_div};
use lnet_domain::token::Token;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Balances of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolLiquidity {
    /// Base token amount used by the pricing curve.
    pub base_token_trading_liquidity: U256,
    /// Network token amount used by the pricing curve.
    pub network_token_trading_liquidity: U256,
    /// Base token equity owned by the pool token holders.
    pub staked_balance: U256,
}

/// Exponentially smoothed network/base rate and the time it was last updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AverageRate {
    pub rate: Fraction,
    pub time: u64,
}

impl AverageRate {
    /// Blends `spot` into the average, at most once per timestamp.
    pub fn updated(&self, spot: &Fraction, weight_ppm: u32, now: u64) -> Result<AverageRate> {
        if now == self.time {
            return Ok(*self);
        }
        let rate = if self.rate.is_zero() {
            *spot
        } else {
            self.rate.weighted_average(spot, weight_ppm)?
        };
        Ok(AverageRate { rate, time: now })
    }
}

/// State of a single base-token pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Liquidity-share token of the pool.
    pub pool_token: Token,
    /// Outstanding pool tokens.
    pub pool_token_supply: U256,
    /// Trading fee in ppm.
    pub trading_fee_ppm: u32,
    /// Whether trades are accepted.
    pub trading_enabled: bool,
    /// Balances.
    pub liquidity: PoolLiquidity,
    /// Smoothed rate guarding deposits.
    pub average_rate: AverageRate,
}

impl PoolState {
    /// Creates an empty, non-tradeable pool.
    #[must_use]
    pub fn new(pool_token: Token, trading_fee_ppm: u32) -> Self {
        Self {
            pool_token,
            pool_token_supply: U256::zero(),
            trading_fee_ppm,
            trading_enabled: false,
            liquidity: PoolLiquidity::default(),
            average_rate: AverageRate::default(),
        }
    }

    /// Current network/base rate of the curve.
    pub fn spot_rate(&self) -> Result<Fraction> {
        spot_rate(
            self.liquidity.base_token_trading_liquidity,
            self.liquidity.network_token_trading_liquidity,
        )
    }

    /// Whether the spot rate lies within `max_deviation_ppm` of the average rate.
    pub fn is_rate_stable(&self, max_deviation_ppm: u32) -> Result<bool> {
        let spot = self.spot_rate()?;
        Ok(spot.is_within_tolerance(&self.average_rate.rate, max_deviation_ppm))
    }

    /// Reserve tokens backing `pool_token_amount`, rounded down.
    pub fn pool_token_to_underlying(&self, pool_token_amount: U256) -> Result<U256> {
        if self.pool_token_supply.is_zero() {
            return Ok(U256::zero());
        }
        mul_div(
            pool_token_amount,
            self.liquidity.staked_balance,
            self.pool_token_supply,
            Rounding::Down,
        )
    }

    /// Pool tokens minted for `reserve_amount`, rounded down. The first
    /// deposit mints one pool token per reserve token.
    pub fn underlying_to_pool_token(&self, reserve_amount: U256) -> Result<U256> {
        if self.pool_token_supply.is_zero() {
            return Ok(reserve_amount);
        }
        if self.liquidity.staked_balance.is_zero() {
            return Err(LiquidityError::DivisionByZero);
        }
        mul_div(
            reserve_amount,
            self.pool_token_supply,
            self.liquidity.staked_balance,
            Rounding::Down,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(staked: u64, supply: u64) -> PoolState {
        let mut state = PoolState::new(Token::from_low_u64(100), 2_000);
        state.pool_token_supply = U256::from(supply);
        state.liquidity.staked_balance = U256::from(staked);
        state
    }

    #[test]
    fn test_first_deposit_mints_one_to_one() {
        let state = pool(0, 0);
        assert_eq!(
            state.underlying_to_pool_token(U256::from(500u64)).unwrap(),
            U256::from(500u64)
        );
    }

    #[test]
    fn test_pool_token_value_tracks_equity() {
        // fees raised equity to 1100 for 1000 pool tokens
        let state = pool(1100, 1000);
        assert_eq!(
            state.pool_token_to_underlying(U256::from(100u64)).unwrap(),
            U256::from(110u64)
        );
        assert_eq!(
            state.underlying_to_pool_token(U256::from(110u64)).unwrap(),
            U256::from(100u64)
        );
    }

    #[test]
    fn test_average_rate_updates_once_per_timestamp() {
        let average = AverageRate {
            rate: Fraction::new(1u64, 1u64).unwrap(),
            time: 10,
        };
        let spot = Fraction::new(2u64, 1u64).unwrap();

        let same_time = average.updated(&spot, 800_000, 10).unwrap();
        assert_eq!(same_time, average);

        let later = average.updated(&spot, 800_000, 11).unwrap();
        assert_eq!(later.rate, Fraction::new(6u64, 5u64).unwrap());
        assert_eq!(later.time, 11);
    }

    #[test]
    fn test_rate_stability() {
        let mut state = pool(1000, 1000);
        state.liquidity.base_token_trading_liquidity = U256::from(1000u64);
        state.liquidity.network_token_trading_liquidity = U256::from(2000u64);
        state.average_rate.rate = Fraction::new(2u64, 1u64).unwrap();
        assert!(state.is_rate_stable(10_000).unwrap());

        state.average_rate.rate = Fraction::new(21u64, 10u64).unwrap();
        assert!(!state.is_rate_stable(10_000).unwrap());
    }
}
