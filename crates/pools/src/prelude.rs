//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use lnet_pools::prelude::*;
//! ```

pub use crate::collection::{DepositAmounts, PoolCollection};
pub use crate::master_pool::{MasterPool, NetworkTokenPoolState, PoolFunding};
pub use crate::pool_state::{AverageRate, PoolLiquidity, PoolState};
pub use crate::trade::{TradeAmountAndFee, TradeEffect, TradeResult};
