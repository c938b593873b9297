//! Network-wide configuration.

use crate::error::{LiquidityError, Result};
use crate::fees::validate_fee_ppm;
use crate::math::compound::GROWTH_FACTOR_SCALE;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

const DAY: u64 = 24 * 60 * 60;

/// Tunable parameters shared by the pool collection, the master pool and
/// the pending withdrawals registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Share of every trading fee skimmed to the protocol, in ppm.
    pub network_fee_ppm: u32,
    /// Trading fee assigned to newly created pools, in ppm.
    pub default_trading_fee_ppm: u32,
    /// Network token trading liquidity a pool needs to stay tradeable.
    pub min_liquidity_for_trading: U256,
    /// Maximum spot/average rate deviation accepted by deposits, in ppm.
    pub average_rate_max_deviation_ppm: u32,
    /// Weight the previous average keeps on each update, in ppm.
    pub average_rate_weight_ppm: u32,
    /// Seconds a withdrawal request stays locked.
    pub lock_duration: u64,
    /// Seconds a ready request can be completed before it expires.
    pub withdrawal_window_duration: u64,
    /// Ceiling of the master pool growth factor, scaled by
    /// [`GROWTH_FACTOR_SCALE`].
    pub max_growth_factor: U256,
    /// Funding limit assigned to newly created pools.
    pub default_funding_limit: U256,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            network_fee_ppm: 200_000,       // 20% of the trading fee
            default_trading_fee_ppm: 2_000, // 0.2%
            min_liquidity_for_trading: U256::from(1_000u64),
            average_rate_max_deviation_ppm: 10_000, // 1%
            average_rate_weight_ppm: 800_000,
            lock_duration: 7 * DAY,
            withdrawal_window_duration: 3 * DAY,
            max_growth_factor: U256::from(GROWTH_FACTOR_SCALE) * U256::from(2u64),
            default_funding_limit: U256::MAX,
        }
    }
}

impl NetworkSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the network fee.
    #[must_use]
    pub fn with_network_fee_ppm(mut self, fee_ppm: u32) -> Self {
        self.network_fee_ppm = fee_ppm;
        self
    }

    /// Sets the default trading fee.
    #[must_use]
    pub fn with_default_trading_fee_ppm(mut self, fee_ppm: u32) -> Self {
        self.default_trading_fee_ppm = fee_ppm;
        self
    }

    /// Sets the minimum network token liquidity for trading.
    #[must_use]
    pub fn with_min_liquidity_for_trading(mut self, amount: impl Into<U256>) -> Self {
        self.min_liquidity_for_trading = amount.into();
        self
    }

    /// Sets the average rate deviation tolerance.
    #[must_use]
    pub fn with_average_rate_max_deviation_ppm(mut self, ppm: u32) -> Self {
        self.average_rate_max_deviation_ppm = ppm;
        self
    }

    /// Sets the average rate smoothing weight.
    #[must_use]
    pub fn with_average_rate_weight_ppm(mut self, ppm: u32) -> Self {
        self.average_rate_weight_ppm = ppm;
        self
    }

    /// Sets the withdrawal lock duration.
    #[must_use]
    pub fn with_lock_duration(mut self, seconds: u64) -> Self {
        self.lock_duration = seconds;
        self
    }

    /// Sets the withdrawal window duration.
    #[must_use]
    pub fn with_withdrawal_window_duration(mut self, seconds: u64) -> Self {
        self.withdrawal_window_duration = seconds;
        self
    }

    /// Sets the growth factor ceiling (scaled).
    #[must_use]
    pub fn with_max_growth_factor(mut self, factor: impl Into<U256>) -> Self {
        self.max_growth_factor = factor.into();
        self
    }

    /// Sets the default funding limit.
    #[must_use]
    pub fn with_default_funding_limit(mut self, limit: impl Into<U256>) -> Self {
        self.default_funding_limit = limit.into();
        self
    }

    /// Checks ranges that would otherwise surface as arithmetic errors later.
    pub fn validate(&self) -> Result<()> {
        validate_fee_ppm(self.network_fee_ppm)?;
        validate_fee_ppm(self.default_trading_fee_ppm)?;
        validate_fee_ppm(self.average_rate_max_deviation_ppm)?;
        validate_fee_ppm(self.average_rate_weight_ppm)?;
        if self.withdrawal_window_duration == 0 {
            return Err(LiquidityError::InvalidAmount);
        }
        if self.max_growth_factor < U256::from(GROWTH_FACTOR_SCALE) {
            return Err(LiquidityError::InvalidRate);
        }
        Ok(())
    }
}
