//! Read-only network facade.
//!
//! [`NetworkInfo`] answers quote and withdrawal-readiness queries by
//! borrowing the engine components; it never mutates them.

use crate::route::{RouteQuote, TradeRoute, compose_by_source, compose_by_target};
use lnet_domain::clock::Clock;
use lnet_domain::error::{LiquidityError, Result};
use lnet_domain::settings::NetworkSettings;
use lnet_domain::token::Token;
use lnet_pools::{MasterPool, PoolCollection, PoolLiquidity};
use lnet_withdrawals::{PendingWithdrawals, WithdrawalId, WithdrawalRequest, WithdrawalStatus};
use primitive_types::U256;

/// Read facade over the engine components.
pub struct NetworkInfo<'a> {
    network_token: Token,
    pool_collection: &'a PoolCollection,
    master_pool: &'a MasterPool,
    pending_withdrawals: &'a PendingWithdrawals,
    clock: &'a dyn Clock,
}

/// Collects the collaborators of a [`NetworkInfo`].
#[derive(Default)]
pub struct NetworkInfoBuilder<'a> {
    network_token: Option<Token>,
    pool_collection: Option<&'a PoolCollection>,
    master_pool: Option<&'a MasterPool>,
    pending_withdrawals: Option<&'a PendingWithdrawals>,
    clock: Option<&'a dyn Clock>,
}

impl<'a> NetworkInfoBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_network_token(mut self, token: Token) -> Self {
        self.network_token = Some(token);
        self
    }

    #[must_use]
    pub fn with_pool_collection(mut self, collection: &'a PoolCollection) -> Self {
        self.pool_collection = Some(collection);
        self
    }

    #[must_use]
    pub fn with_master_pool(mut self, master: &'a MasterPool) -> Self {
        self.master_pool = Some(master);
        self
    }

    #[must_use]
    pub fn with_pending_withdrawals(mut self, pending: &'a PendingWithdrawals) -> Self {
        self.pending_withdrawals = Some(pending);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the facade.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InvalidAddress`] naming the first missing
    /// collaborator, a zero network token, or a component configured for a
    /// different network token.
    pub fn build(self) -> Result<NetworkInfo<'a>> {
        let network_token = self
            .network_token
            .filter(|token| !token.is_zero())
            .ok_or(LiquidityError::InvalidAddress("network token"))?;
        let pool_collection = self
            .pool_collection
            .filter(|collection| collection.network_token() == network_token)
            .ok_or(LiquidityError::InvalidAddress("pool collection"))?;
        let master_pool = self
            .master_pool
            .filter(|master| master.network_token() == network_token)
            .ok_or(LiquidityError::InvalidAddress("master pool"))?;
        let pending_withdrawals = self
            .pending_withdrawals
            .ok_or(LiquidityError::InvalidAddress("pending withdrawals"))?;
        let clock = self.clock.ok_or(LiquidityError::InvalidAddress("clock"))?;

        Ok(NetworkInfo {
            network_token,
            pool_collection,
            master_pool,
            pending_withdrawals,
            clock,
        })
    }
}

impl<'a> NetworkInfo<'a> {
    pub fn builder() -> NetworkInfoBuilder<'a> {
        NetworkInfoBuilder::new()
    }

    pub fn network_token(&self) -> Token {
        self.network_token
    }

    pub fn pool_collection(&self) -> &'a PoolCollection {
        self.pool_collection
    }

    pub fn master_pool(&self) -> &'a MasterPool {
        self.master_pool
    }

    pub fn pending_withdrawals(&self) -> &'a PendingWithdrawals {
        self.pending_withdrawals
    }

    pub fn settings(&self) -> &'a NetworkSettings {
        self.pool_collection.settings()
    }

    /// Current time of the facade's clock.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    fn route(&self, source: &Token, target: &Token) -> Result<TradeRoute> {
        source.validate("source token")?;
        target.validate("target token")?;
        TradeRoute::resolve(self.network_token, *source, *target)
    }

    /// Full route quote for `amount` source tokens.
    pub fn quote_by_source(
        &self,
        source: &Token,
        target: &Token,
        amount: U256,
    ) -> Result<RouteQuote> {
        let route = self.route(source, target)?;
        compose_by_source(self.pool_collection, &route, amount)
    }

    /// Full route quote for receiving `amount` target tokens.
    pub fn quote_by_target(
        &self,
        source: &Token,
        target: &Token,
        amount: U256,
    ) -> Result<RouteQuote> {
        let route = self.route(source, target)?;
        compose_by_target(self.pool_collection, &route, amount)
    }

    /// Target tokens received for `amount` source tokens, net of fees.
    pub fn trade_target_amount(
        &self,
        source: &Token,
        target: &Token,
        amount: U256,
    ) -> Result<U256> {
        Ok(self.quote_by_source(source, target, amount)?.target_amount)
    }

    /// Source tokens needed to receive `amount` target tokens.
    pub fn trade_source_amount(
        &self,
        source: &Token,
        target: &Token,
        amount: U256,
    ) -> Result<U256> {
        Ok(self.quote_by_target(source, target, amount)?.source_amount)
    }

    pub fn is_ready_for_withdrawal(&self, id: WithdrawalId) -> bool {
        self.pending_withdrawals.is_ready_for_withdrawal(id, self.clock.now())
    }

    pub fn withdrawal_request(&self, id: WithdrawalId) -> Option<&'a WithdrawalRequest> {
        self.pending_withdrawals.withdrawal_request(id)
    }

    pub fn withdrawal_status(&self, id: WithdrawalId) -> Option<WithdrawalStatus> {
        self.pending_withdrawals.status(id, self.clock.now())
    }

    pub fn trading_liquidity(&self, token: &Token) -> Result<PoolLiquidity> {
        self.pool_collection.trading_liquidity(token)
    }

    pub fn trading_fee_ppm(&self, token: &Token) -> Result<u32> {
        self.pool_collection.trading_fee_ppm(token)
    }

    pub fn trading_enabled(&self, token: &Token) -> Result<bool> {
        self.pool_collection.trading_enabled(token)
    }

    /// Staked balance of `token`'s pool; the master pool's for the network token.
    pub fn staked_balance(&self, token: &Token) -> Result<U256> {
        if *token == self.network_token {
            return Ok(self.master_pool.staked_balance());
        }
        self.pool_collection.staked_balance(token)
    }

    /// Pool token of `token`'s pool; the master pool's for the network token.
    pub fn pool_token(&self, token: &Token) -> Result<Token> {
        if *token == self.network_token {
            return Ok(self.master_pool.pool_token());
        }
        self.pool_collection.pool_token(token)
    }

    pub fn pool_token_to_underlying(&self, token: &Token, pool_token_amount: U256) -> Result<U256> {
        self.pool_collection
            .pool_token_to_underlying(token, pool_token_amount)
    }

    pub fn underlying_to_pool_token(&self, token: &Token, reserve_amount: U256) -> Result<U256> {
        self.pool_collection
            .underlying_to_pool_token(token, reserve_amount)
    }

    /// Network tokens `token`'s pool may still borrow now.
    pub fn available_funding(&self, token: &Token) -> Result<U256> {
        self.master_pool.available_liquidity(token, self.clock.now())
    }

    /// Master pool growth factor now, scaled by the growth factor scale.
    pub fn growth_factor(&self) -> Result<U256> {
        self.master_pool.growth_factor_at(self.clock.now())
    }
}
