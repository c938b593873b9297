//! Network token pool.
//!
//! Network token stakers back the network-side trading liquidity of every
//! other pool. The amount that may be lent out is `staked_balance ×
//! growth_factor`, where the growth factor compounds over time at the
//! funding rate up to a configured ceiling. The growth factor is computed
//! lazily from `(stored state, now)`; nothing runs in the background.

use lnet_domain::access::{AdminCapability, CapabilityKey};
use lnet_domain::error::{LiquidityError, Result};
use lnet_domain::math::checked::{checked_add, checked_sub};
use lnet_domain::math::{Fraction, GROWTH_FACTOR_SCALE, Rounding, compound, mul_div};
use lnet_domain::settings::NetworkSettings;
use lnet_domain::token::Token;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Singleton state of the network token pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTokenPoolState {
    /// Network token equity owned by stakers.
    pub staked_balance: U256,
    /// Growth per elapsed second.
    pub funding_rate: Fraction,
    /// Multiplier scaled by [`GROWTH_FACTOR_SCALE`]; never decreases.
    pub growth_factor: U256,
    /// Timestamp the stored growth factor refers to.
    pub growth_factor_updated_at: u64,
    /// Ceiling of the growth factor.
    pub max_growth_factor: U256,
}

/// Funding extended to a single pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolFunding {
    /// Network tokens currently lent to the pool.
    pub current: U256,
    /// Upper bound of `current`.
    pub limit: U256,
}

/// The network token pool and its lending book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterPool {
    admin: CapabilityKey,
    network_token: Token,
    pool_token: Token,
    pool_token_supply: U256,
    state: NetworkTokenPoolState,
    funding: BTreeMap<Token, PoolFunding>,
    total_funding: U256,
}

impl MasterPool {
    /// Creates an empty master pool whose growth factor starts at one at `now`.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InvalidAddress`] for a zero network token, or any
    /// settings validation error.
    pub fn new(
        admin: CapabilityKey,
        network_token: Token,
        funding_rate: Fraction,
        settings: &NetworkSettings,
        now: u64,
    ) -> Result<Self> {
        network_token.validate("network token")?;
        settings.validate()?;
        Ok(Self {
            admin,
            network_token,
            pool_token: network_token.derive_pool_token(),
            pool_token_supply: U256::zero(),
            state: NetworkTokenPoolState {
                staked_balance: U256::zero(),
                funding_rate,
                growth_factor: U256::from(GROWTH_FACTOR_SCALE),
                growth_factor_updated_at: now,
                max_growth_factor: settings.max_growth_factor,
            },
            funding: BTreeMap::new(),
            total_funding: U256::zero(),
        })
    }

    pub fn network_token(&self) -> Token {
        self.network_token
    }

    pub fn pool_token(&self) -> Token {
        self.pool_token
    }

    pub fn pool_token_supply(&self) -> U256 {
        self.pool_token_supply
    }

    pub fn state(&self) -> &NetworkTokenPoolState {
        &self.state
    }

    pub fn staked_balance(&self) -> U256 {
        self.state.staked_balance
    }

    /// Network tokens lent to all pools.
    pub fn total_funding(&self) -> U256 {
        self.total_funding
    }

    /// Network tokens lent to `pool`.
    pub fn current_pool_funding(&self, pool: &Token) -> U256 {
        self.funding
            .get(pool)
            .map(|f| f.current)
            .unwrap_or_default()
    }

    pub fn funding_limit(&self, pool: &Token) -> U256 {
        self.funding.get(pool).map(|f| f.limit).unwrap_or_default()
    }

    pub fn is_registered(&self, pool: &Token) -> bool {
        self.funding.contains_key(pool)
    }

    /// Growth factor at `now`, without committing it.
    pub fn growth_factor_at(&self, now: u64) -> Result<U256> {
        let elapsed = now.saturating_sub(self.state.growth_factor_updated_at);
        compound(
            self.state.growth_factor,
            &self.state.funding_rate,
            elapsed,
            self.state.max_growth_factor,
        )
    }

    /// Commits the growth factor for `now`. Calling it again for the same or
    /// an earlier time changes nothing.
    pub fn update_growth_factor(&mut self, now: u64) -> Result<U256> {
        if now <= self.state.growth_factor_updated_at {
            return Ok(self.state.growth_factor);
        }
        let growth_factor = self.growth_factor_at(now)?;
        if growth_factor != self.state.growth_factor {
            debug!(
                old = %self.state.growth_factor,
                new = %growth_factor,
                now,
                "Growth factor updated"
            );
        }
        self.state.growth_factor = growth_factor;
        self.state.growth_factor_updated_at = now;
        Ok(growth_factor)
    }

    /// Total network tokens that may be lent out at `now`.
    pub fn funding_capacity(&self, now: u64) -> Result<U256> {
        let growth_factor = self.growth_factor_at(now)?;
        mul_div(
            self.state.staked_balance,
            growth_factor,
            U256::from(GROWTH_FACTOR_SCALE),
            Rounding::Down,
        )
    }

    /// Network tokens `pool` may still borrow at `now`: the smaller of the
    /// unused network capacity and the pool's unused limit.
    pub fn available_liquidity(&self, pool: &Token, now: u64) -> Result<U256> {
        let funding = self.funding.get(pool).ok_or(LiquidityError::InvalidToken)?;
        let capacity_left = self
            .funding_capacity(now)?
            .saturating_sub(self.total_funding);
        let limit_left = funding.limit.saturating_sub(funding.current);
        Ok(capacity_left.min(limit_left))
    }

    /// Registers `pool` as a borrower with the given limit.
    pub(crate) fn register_pool(&mut self, pool: Token, limit: U256) -> Result<()> {
        if self.funding.contains_key(&pool) {
            return Err(LiquidityError::AlreadyExists);
        }
        self.funding.insert(
            pool,
            PoolFunding {
                current: U256::zero(),
                limit,
            },
        );
        Ok(())
    }

    /// Lends `amount` network tokens to `pool`.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InsufficientLiquidity`] when the request exceeds
    /// [`available_liquidity`](Self::available_liquidity).
    pub fn request_funding(&mut self, pool: &Token, amount: U256, now: u64) -> Result<()> {
        if amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }
        if amount > self.available_liquidity(pool, now)? {
            return Err(LiquidityError::InsufficientLiquidity);
        }
        let current = checked_add(self.current_pool_funding(pool), amount)?;
        let total = checked_add(self.total_funding, amount)?;

        self.update_growth_factor(now)?;
        if let Some(funding) = self.funding.get_mut(pool) {
            funding.current = current;
        }
        self.total_funding = total;

        info!(pool = %pool, amount = %amount, total = %total, "Funding requested");
        Ok(())
    }

    /// Returns up to `amount` network tokens lent to `pool`; returns the
    /// amount actually released.
    pub fn renounce_funding(&mut self, pool: &Token, amount: U256, now: u64) -> Result<U256> {
        let funding = *self.funding.get(pool).ok_or(LiquidityError::InvalidToken)?;
        let released = funding.current.min(amount);
        let total = checked_sub(self.total_funding, released)?;

        self.update_growth_factor(now)?;
        if let Some(entry) = self.funding.get_mut(pool) {
            entry.current = funding.current - released;
        }
        self.total_funding = total;

        info!(pool = %pool, amount = %released, total = %total, "Funding renounced");
        Ok(released)
    }

    /// Checks that crediting every `(pool, fee)` pair to stakers cannot
    /// overflow and that every pool is a registered borrower.
    pub(crate) fn check_fee_accrual(&self, fees: &[(Token, U256)]) -> Result<()> {
        let mut staked = self.state.staked_balance;
        let mut total = self.total_funding;
        for (pool, fee) in fees.iter().filter(|(_, fee)| !fee.is_zero()) {
            if !self.funding.contains_key(pool) {
                return Err(LiquidityError::InvalidToken);
            }
            checked_add(self.current_pool_funding(pool), *fee)?;
            staked = checked_add(staked, *fee)?;
            total = checked_add(total, *fee)?;
        }
        Ok(())
    }

    /// Credits network token trading fees earned by `pool` to stakers. The
    /// fee stays in the pool's trading liquidity, so it counts as funding.
    pub(crate) fn accrue_fees(&mut self, pool: &Token, fee: U256) {
        if fee.is_zero() {
            return;
        }
        self.state.staked_balance = self.state.staked_balance.saturating_add(fee);
        if let Some(funding) = self.funding.get_mut(pool) {
            funding.current = funding.current.saturating_add(fee);
        }
        self.total_funding = self.total_funding.saturating_add(fee);
        debug!(pool = %pool, fee = %fee, "Network token fees collected");
    }

    /// Stakes `amount` network tokens; returns the master pool tokens minted.
    pub fn deposit(&mut self, amount: U256) -> Result<U256> {
        if amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }
        let pool_token_amount = if self.pool_token_supply.is_zero() {
            amount
        } else {
            mul_div(
                amount,
                self.pool_token_supply,
                self.state.staked_balance,
                Rounding::Down,
            )?
        };
        let staked = checked_add(self.state.staked_balance, amount)?;
        let supply = checked_add(self.pool_token_supply, pool_token_amount)?;

        self.state.staked_balance = staked;
        self.pool_token_supply = supply;

        info!(amount = %amount, pool_tokens = %pool_token_amount, "Network token staked");
        Ok(pool_token_amount)
    }

    /// Burns `pool_token_amount` master pool tokens; returns the network
    /// tokens released. Fails if the remaining stake could no longer back
    /// the funding already lent out.
    pub fn withdraw(&mut self, pool_token_amount: U256, now: u64) -> Result<U256> {
        if pool_token_amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }
        if pool_token_amount > self.pool_token_supply {
            return Err(LiquidityError::InvalidAmount);
        }
        let amount = mul_div(
            pool_token_amount,
            self.state.staked_balance,
            self.pool_token_supply,
            Rounding::Down,
        )?;
        let staked = checked_sub(self.state.staked_balance, amount)?;
        let growth_factor = self.growth_factor_at(now)?;
        let capacity = mul_div(
            staked,
            growth_factor,
            U256::from(GROWTH_FACTOR_SCALE),
            Rounding::Down,
        )?;
        if capacity < self.total_funding {
            return Err(LiquidityError::InsufficientLiquidity);
        }

        self.update_growth_factor(now)?;
        self.state.staked_balance = staked;
        self.pool_token_supply -= pool_token_amount;

        info!(amount = %amount, pool_tokens = %pool_token_amount, "Network token unstaked");
        Ok(amount)
    }

    /// Sets the funding limit of `pool`.
    pub fn set_funding_limit(
        &mut self,
        capability: &AdminCapability,
        pool: &Token,
        limit: U256,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        let funding = self
            .funding
            .get_mut(pool)
            .ok_or(LiquidityError::InvalidToken)?;
        funding.limit = limit;
        info!(pool = %pool, limit = %limit, "Funding limit updated");
        Ok(())
    }

    /// Changes the funding rate. Growth up to `now` is committed at the old rate.
    pub fn set_funding_rate(
        &mut self,
        capability: &AdminCapability,
        funding_rate: Fraction,
        now: u64,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        self.update_growth_factor(now)?;
        self.state.funding_rate = funding_rate;
        info!(rate = %funding_rate, "Funding rate updated");
        Ok(())
    }

    /// Changes the growth factor ceiling. A ceiling below the current factor
    /// stops further growth but never lowers the factor.
    pub fn set_max_growth_factor(
        &mut self,
        capability: &AdminCapability,
        max_growth_factor: U256,
        now: u64,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        if max_growth_factor < U256::from(GROWTH_FACTOR_SCALE) {
            return Err(LiquidityError::InvalidRate);
        }
        self.update_growth_factor(now)?;
        self.state.max_growth_factor = max_growth_factor;
        info!(max = %max_growth_factor, "Growth factor ceiling updated");
        Ok(())
    }
}
