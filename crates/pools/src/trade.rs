//! Trade quotes and prepared trade effects.

use crate::pool_state::PoolState;
use lnet_domain::fees::FeeSplit;
use lnet_domain::token::Token;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Quote of a single-hop trade.
///
/// `amount` is the net target amount when quoting by source amount and the
/// required source amount when quoting by target amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradeAmountAndFee {
    pub amount: U256,
    pub trading_fee_amount: U256,
    pub network_fee_amount: U256,
}

/// Both sides of a priced hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    pub source_token: Token,
    pub target_token: Token,
    pub source_amount: U256,
    /// Net amount received by the trader.
    pub target_amount: U256,
    pub trading_fee_amount: U256,
    pub network_fee_amount: U256,
}

impl TradeResult {
    pub(crate) fn new(
        source_token: Token,
        target_token: Token,
        source_amount: U256,
        target_amount: U256,
        fee: FeeSplit,
    ) -> Self {
        Self {
            source_token,
            target_token,
            source_amount,
            target_amount,
            trading_fee_amount: fee.trading_fee_amount,
            network_fee_amount: fee.network_fee_amount,
        }
    }

    /// Projects the result onto the quote shape for the given direction.
    pub fn quote(&self, by_source_amount: bool) -> TradeAmountAndFee {
        TradeAmountAndFee {
            amount: if by_source_amount {
                self.target_amount
            } else {
                self.source_amount
            },
            trading_fee_amount: self.trading_fee_amount,
            network_fee_amount: self.network_fee_amount,
        }
    }

    /// Total fee charged on the output.
    pub fn fee_charged(&self) -> U256 {
        self.trading_fee_amount
            .saturating_add(self.network_fee_amount)
    }
}

/// A fully computed trade that has not been committed yet.
///
/// Produced by [`PoolCollection::prepare_trade`](crate::PoolCollection::prepare_trade)
/// and committed by [`PoolCollection::apply_trades`](crate::PoolCollection::apply_trades).
/// The effect records the pool state it was computed against; applying it
/// to a pool that changed in between fails with `StaleQuote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeEffect {
    pub(crate) pool: Token,
    pub(crate) before: PoolState,
    pub(crate) after: PoolState,
    /// Network token fee credited to master pool stakers.
    pub(crate) master_fee: U256,
    pub(crate) result: TradeResult,
}

impl TradeEffect {
    /// Reserve token of the pool this hop trades against.
    pub fn pool(&self) -> Token {
        self.pool
    }

    pub fn result(&self) -> &TradeResult {
        &self.result
    }

    /// Pool state after the trade is committed.
    pub fn pool_state_after(&self) -> &PoolState {
        &self.after
    }
}
