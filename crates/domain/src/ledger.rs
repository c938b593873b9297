//! Interfaces to collaborators living outside the engine core.

use crate::error::{LiquidityError, Result};
use crate::math::checked::{checked_add, checked_sub};
use crate::token::{Address, Token};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read access to pool-token balances held by providers.
pub trait PoolTokenLedger {
    fn balance_of(&self, pool_token: &Token, holder: &Address) -> U256;
}

/// Values pool tokens in their underlying reserve token.
pub trait ReserveValuation {
    /// Reserve-token amount currently backing `pool_token_amount` pool tokens.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InvalidToken`] for an unknown pool token.
    fn underlying_value(&self, pool_token: &Token, pool_token_amount: U256) -> Result<U256>;
}

/// In-memory pool-token ledger for hosts that keep balances alongside the
/// engine state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryPoolTokenLedger {
    balances: BTreeMap<Token, BTreeMap<Address, U256>>,
}

impl InMemoryPoolTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, pool_token: Token, holder: Address, amount: U256) -> Result<()> {
        let balance = self
            .balances
            .entry(pool_token)
            .or_default()
            .entry(holder)
            .or_default();
        *balance = checked_add(*balance, amount)?;
        Ok(())
    }

    pub fn burn(&mut self, pool_token: Token, holder: Address, amount: U256) -> Result<()> {
        let balance = self
            .balances
            .get_mut(&pool_token)
            .and_then(|holders| holders.get_mut(&holder))
            .ok_or(LiquidityError::InvalidAmount)?;
        *balance = checked_sub(*balance, amount).map_err(|_| LiquidityError::InvalidAmount)?;
        Ok(())
    }
}

impl PoolTokenLedger for InMemoryPoolTokenLedger {
    fn balance_of(&self, pool_token: &Token, holder: &Address) -> U256 {
        self.balances
            .get(pool_token)
            .and_then(|holders| holders.get(holder))
            .copied()
            .unwrap_or_default()
    }
}
