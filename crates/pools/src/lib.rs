//! Pool pricing and liquidity accounting.
//!
//! This crate provides the mutable pool ledgers of the network:
//! - Per-pool state: trading liquidity, staked balance, pool-token supply
//! - The pool collection: trade quoting and execution, deposits, withdrawals
//! - The master pool: network token staking and funding with a compounding
//!   growth factor

/// Prelude module for convenient imports.
pub mod prelude;

/// Pool collection.
pub mod collection;
/// Network token pool.
pub mod master_pool;
/// Per-pool ledger.
pub mod pool_state;
/// Trade quotes and prepared effects.
pub mod trade;

#[cfg(test)]
mod proptest_properties;

pub use collection::{DepositAmounts, PoolCollection};
pub use master_pool::{MasterPool, NetworkTokenPoolState, PoolFunding};
pub use pool_state::{AverageRate, PoolLiquidity, PoolState};
pub use trade::{TradeAmountAndFee, TradeEffect, TradeResult};
