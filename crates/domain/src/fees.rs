use crate::error::{LiquidityError, Result};
use crate::math::checked::{PPM_RESOLUTION, Rounding, checked_sub, mul_div, mul_ppm};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Fee charged on a trade, split between liquidity providers and the
/// protocol-wide network fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Portion left in the pool for its liquidity providers.
    pub trading_fee_amount: U256,
    /// Portion skimmed to the protocol.
    pub network_fee_amount: U256,
}

impl FeeSplit {
    /// Total fee charged to the trader.
    pub fn total(&self) -> U256 {
        self.trading_fee_amount.saturating_add(self.network_fee_amount)
    }
}

/// Rejects fees above 100%.
pub fn validate_fee_ppm(fee_ppm: u32) -> Result<u32> {
    if fee_ppm > PPM_RESOLUTION {
        return Err(LiquidityError::InvalidFee);
    }
    Ok(fee_ppm)
}

/// Fee taken out of a gross output amount, rounded up.
pub fn fee_on_output(gross_amount: U256, fee_ppm: u32) -> Result<U256> {
    mul_ppm(gross_amount, validate_fee_ppm(fee_ppm)?, Rounding::Up)
}

/// Gross output needed so that `net_amount` remains after the fee.
///
/// formula: gross = net * PPM / (PPM - fee), rounded up
pub fn gross_for_net(net_amount: U256, fee_ppm: u32) -> Result<U256> {
    let fee_ppm = validate_fee_ppm(fee_ppm)?;
    mul_div(
        net_amount,
        U256::from(PPM_RESOLUTION),
        U256::from(PPM_RESOLUTION - fee_ppm),
        Rounding::Up,
    )
}

/// Splits a charged fee: the network share is rounded down so that the
/// two parts always add up to exactly the charged fee.
pub fn split_fee(fee_charged: U256, network_fee_ppm: u32) -> Result<FeeSplit> {
    let network_fee_amount = mul_ppm(
        fee_charged,
        validate_fee_ppm(network_fee_ppm)?,
        Rounding::Down,
    )?;
    Ok(FeeSplit {
        trading_fee_amount: checked_sub(fee_charged, network_fee_amount)?,
        network_fee_amount,
    })
}
