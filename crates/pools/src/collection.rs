//! Pool collection: trade pricing and execution, liquidity deposits and
//! withdrawals for every base-token pool.
//!
//! Pools are kept in an arena keyed by their reserve token. Every trade has
//! the network token on one side; the other side selects the pool. Mutating
//! operations compute all new values first and only then write them, so a
//! failed call leaves the collection and the master pool untouched.

use crate::master_pool::MasterPool;
use crate::pool_state::{AverageRate, PoolLiquidity, PoolState};
use crate::trade::{TradeAmountAndFee, TradeEffect, TradeResult};
use lnet_domain::access::{AdminCapability, CapabilityKey};
use lnet_domain::error::{LiquidityError, Result};
use lnet_domain::fees::{fee_on_output, gross_for_net, split_fee, validate_fee_ppm};
use lnet_domain::ledger::ReserveValuation;
use lnet_domain::math::checked::{checked_add, checked_sub};
use lnet_domain::math::constant_product::{source_amount_by_target, target_amount_by_source};
use lnet_domain::math::{Fraction, Rounding, mul_div};
use lnet_domain::settings::NetworkSettings;
use lnet_domain::token::{Address, Token};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Outcome of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepositAmounts {
    /// Pool tokens minted to the provider.
    pub pool_token_amount: U256,
    /// Base tokens added to the curve.
    pub base_token_trading_liquidity_increase: U256,
    /// Network tokens borrowed from the master pool and added to the curve.
    pub network_token_trading_liquidity_increase: U256,
}

/// All base-token pools of the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolCollection {
    admin: CapabilityKey,
    network_token: Token,
    settings: NetworkSettings,
    pools: BTreeMap<Token, PoolState>,
    /// Pool token id to reserve token.
    pool_tokens: BTreeMap<Token, Token>,
    /// Network fees skimmed from trades, by the token they are paid in.
    network_fees: BTreeMap<Token, U256>,
}

impl PoolCollection {
    /// Creates an empty collection.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InvalidAddress`] for a zero network token, or any
    /// settings validation error.
    pub fn new(
        admin: CapabilityKey,
        network_token: Token,
        settings: NetworkSettings,
    ) -> Result<Self> {
        network_token.validate("network token")?;
        settings.validate()?;
        Ok(Self {
            admin,
            network_token,
            settings,
            pools: BTreeMap::new(),
            pool_tokens: BTreeMap::new(),
            network_fees: BTreeMap::new(),
        })
    }

    pub fn network_token(&self) -> Token {
        self.network_token
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    pub fn pool(&self, token: &Token) -> Option<&PoolState> {
        self.pools.get(token)
    }

    pub fn pools(&self) -> impl Iterator<Item = (&Token, &PoolState)> {
        self.pools.iter()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn is_pool_valid(&self, token: &Token) -> bool {
        self.pools.contains_key(token)
    }

    /// Reserve token of the pool issuing `pool_token`.
    pub fn reserve_token(&self, pool_token: &Token) -> Option<Token> {
        self.pool_tokens.get(pool_token).copied()
    }

    fn existing_pool(&self, token: &Token) -> Result<&PoolState> {
        self.pools.get(token).ok_or(LiquidityError::InvalidToken)
    }

    pub fn pool_token(&self, token: &Token) -> Result<Token> {
        Ok(self.existing_pool(token)?.pool_token)
    }

    pub fn trading_liquidity(&self, token: &Token) -> Result<PoolLiquidity> {
        Ok(self.existing_pool(token)?.liquidity)
    }

    pub fn staked_balance(&self, token: &Token) -> Result<U256> {
        Ok(self.existing_pool(token)?.liquidity.staked_balance)
    }

    pub fn trading_fee_ppm(&self, token: &Token) -> Result<u32> {
        Ok(self.existing_pool(token)?.trading_fee_ppm)
    }

    pub fn trading_enabled(&self, token: &Token) -> Result<bool> {
        Ok(self.existing_pool(token)?.trading_enabled)
    }

    pub fn average_rate(&self, token: &Token) -> Result<AverageRate> {
        Ok(self.existing_pool(token)?.average_rate)
    }

    /// Network fees accumulated in `token` and not yet collected.
    pub fn network_fees(&self, token: &Token) -> U256 {
        self.network_fees.get(token).copied().unwrap_or_default()
    }

    /// Reserve tokens backing `pool_token_amount` pool tokens of `token`'s pool.
    pub fn pool_token_to_underlying(&self, token: &Token, pool_token_amount: U256) -> Result<U256> {
        self.existing_pool(token)?
            .pool_token_to_underlying(pool_token_amount)
    }

    /// Pool tokens of `token`'s pool worth `reserve_amount` reserve tokens.
    pub fn underlying_to_pool_token(&self, token: &Token, reserve_amount: U256) -> Result<U256> {
        self.existing_pool(token)?
            .underlying_to_pool_token(reserve_amount)
    }

    /// Registers a new pool for `token` and makes it a borrower of the
    /// master pool with the default funding limit. Trading starts disabled.
    pub fn create_pool(
        &mut self,
        capability: &AdminCapability,
        master: &mut MasterPool,
        token: Token,
    ) -> Result<Token> {
        self.admin.authorize(capability)?;
        token.validate("token")?;
        if token == self.network_token {
            return Err(LiquidityError::InvalidToken);
        }
        if self.pools.contains_key(&token) {
            return Err(LiquidityError::AlreadyExists);
        }
        let pool_token = token.derive_pool_token();
        if self.pool_tokens.contains_key(&pool_token) {
            return Err(LiquidityError::AlreadyExists);
        }
        // pool token ids share the token namespace with reserves
        let reserved = [self.network_token, master.pool_token()];
        if self.pool_tokens.contains_key(&token)
            || self.pools.contains_key(&pool_token)
            || reserved.contains(&token)
            || reserved.contains(&pool_token)
            || pool_token.is_zero()
        {
            return Err(LiquidityError::InvalidToken);
        }

        master.register_pool(token, self.settings.default_funding_limit)?;
        self.pools.insert(
            token,
            PoolState::new(pool_token, self.settings.default_trading_fee_ppm),
        );
        self.pool_tokens.insert(pool_token, token);

        info!(token = %token, pool_token = %pool_token, "Pool created");
        Ok(pool_token)
    }

    /// Seeds the curve of `token`'s pool at `initial_rate` (network tokens
    /// per base token) and opens it for trading.
    ///
    /// The network side is the minimum liquidity for trading, borrowed from
    /// the master pool; the base side is taken from the staked balance.
    pub fn enable_trading(
        &mut self,
        capability: &AdminCapability,
        master: &mut MasterPool,
        token: &Token,
        initial_rate: Fraction,
        now: u64,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        let pool = self.existing_pool(token)?;
        if pool.trading_enabled {
            return Err(LiquidityError::AlreadyExists);
        }
        if !initial_rate.is_positive() {
            return Err(LiquidityError::InvalidRate);
        }

        let network_liquidity = self.settings.min_liquidity_for_trading;
        let base_liquidity = initial_rate.div_amount(network_liquidity, Rounding::Up)?;
        if base_liquidity > pool.liquidity.staked_balance {
            return Err(LiquidityError::InsufficientLiquidity);
        }

        master.request_funding(token, network_liquidity, now)?;
        if let Some(pool) = self.pools.get_mut(token) {
            pool.liquidity.base_token_trading_liquidity = base_liquidity;
            pool.liquidity.network_token_trading_liquidity = network_liquidity;
            pool.average_rate = AverageRate {
                rate: initial_rate,
                time: now,
            };
            pool.trading_enabled = true;
        }

        info!(
            token = %token,
            base = %base_liquidity,
            network = %network_liquidity,
            rate = %initial_rate,
            "Trading enabled"
        );
        Ok(())
    }

    /// Closes `token`'s pool for trading and returns its network token
    /// funding to the master pool.
    pub fn disable_trading(
        &mut self,
        capability: &AdminCapability,
        master: &mut MasterPool,
        token: &Token,
        now: u64,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        self.existing_pool(token)?;
        self.reset_trading_liquidity(master, token, now)?;
        info!(token = %token, "Trading disabled");
        Ok(())
    }

    fn reset_trading_liquidity(
        &mut self,
        master: &mut MasterPool,
        token: &Token,
        now: u64,
    ) -> Result<()> {
        master.renounce_funding(token, master.current_pool_funding(token), now)?;
        if let Some(pool) = self.pools.get_mut(token) {
            pool.liquidity.base_token_trading_liquidity = U256::zero();
            pool.liquidity.network_token_trading_liquidity = U256::zero();
            pool.trading_enabled = false;
        }
        Ok(())
    }

    pub fn set_trading_fee_ppm(
        &mut self,
        capability: &AdminCapability,
        token: &Token,
        fee_ppm: u32,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        let fee_ppm = validate_fee_ppm(fee_ppm)?;
        let pool = self
            .pools
            .get_mut(token)
            .ok_or(LiquidityError::InvalidToken)?;
        pool.trading_fee_ppm = fee_ppm;
        info!(token = %token, fee_ppm, "Trading fee updated");
        Ok(())
    }

    pub fn set_network_fee_ppm(
        &mut self,
        capability: &AdminCapability,
        fee_ppm: u32,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        self.settings.network_fee_ppm = validate_fee_ppm(fee_ppm)?;
        info!(fee_ppm, "Network fee updated");
        Ok(())
    }

    pub fn set_min_liquidity_for_trading(
        &mut self,
        capability: &AdminCapability,
        amount: U256,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        self.settings.min_liquidity_for_trading = amount;
        info!(amount = %amount, "Minimum liquidity for trading updated");
        Ok(())
    }

    pub fn set_average_rate_max_deviation_ppm(
        &mut self,
        capability: &AdminCapability,
        deviation_ppm: u32,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        self.settings.average_rate_max_deviation_ppm = validate_fee_ppm(deviation_ppm)?;
        info!(deviation_ppm, "Average rate deviation updated");
        Ok(())
    }

    /// Pays out the network fees accumulated in `token`.
    pub fn collect_network_fees(
        &mut self,
        capability: &AdminCapability,
        token: &Token,
    ) -> Result<U256> {
        self.admin.authorize(capability)?;
        let amount = self.network_fees.remove(token).unwrap_or_default();
        info!(token = %token, amount = %amount, "Network fees collected");
        Ok(amount)
    }

    /// Pool a single hop trades against, checking the token pair.
    fn hop_pool(&self, source: &Token, target: &Token, amount: U256) -> Result<(Token, bool)> {
        if source == target {
            return Err(LiquidityError::InvalidTokens);
        }
        if amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }
        let (pool, target_is_network) = if *source == self.network_token {
            (*target, false)
        } else if *target == self.network_token {
            (*source, true)
        } else {
            return Err(LiquidityError::InvalidTokens);
        };
        match self.pools.get(&pool) {
            Some(state) if state.trading_enabled => Ok((pool, target_is_network)),
            _ => Err(LiquidityError::InvalidToken),
        }
    }

    /// Prices a hop against `state`.
    ///
    /// The fee is taken from the gross output and rounded up; the network
    /// fee is the configured share of it, rounded down.
    fn price(
        &self,
        state: &PoolState,
        source: &Token,
        target: &Token,
        target_is_network: bool,
        amount: U256,
        by_source_amount: bool,
    ) -> Result<TradeResult> {
        let liquidity = &state.liquidity;
        let (source_balance, target_balance) = if target_is_network {
            (
                liquidity.base_token_trading_liquidity,
                liquidity.network_token_trading_liquidity,
            )
        } else {
            (
                liquidity.network_token_trading_liquidity,
                liquidity.base_token_trading_liquidity,
            )
        };

        let (source_amount, target_amount, fee_charged) = if by_source_amount {
            let gross = target_amount_by_source(source_balance, target_balance, amount)?;
            let fee = fee_on_output(gross, state.trading_fee_ppm)?;
            (amount, checked_sub(gross, fee)?, fee)
        } else {
            let gross = gross_for_net(amount, state.trading_fee_ppm)?;
            let source_amount = source_amount_by_target(source_balance, target_balance, gross)?;
            (source_amount, amount, checked_sub(gross, amount)?)
        };

        let fee = split_fee(fee_charged, self.settings.network_fee_ppm)?;
        Ok(TradeResult::new(
            *source,
            *target,
            source_amount,
            target_amount,
            fee,
        ))
    }

    /// Quotes a single-hop trade without changing any state.
    ///
    /// With `by_source_amount` the returned amount is the net target amount
    /// received for `amount` source tokens; otherwise it is the source
    /// amount needed to receive `amount` target tokens.
    ///
    /// # Errors
    ///
    /// - [`LiquidityError::InvalidTokens`] when `source == target` or
    ///   neither side is the network token
    /// - [`LiquidityError::ZeroValue`] for a zero amount
    /// - [`LiquidityError::InvalidToken`] for an unknown or disabled pool
    pub fn trade_amount_and_fee(
        &self,
        source: &Token,
        target: &Token,
        amount: U256,
        by_source_amount: bool,
    ) -> Result<TradeAmountAndFee> {
        let (pool, target_is_network) = self.hop_pool(source, target, amount)?;
        let state = self.existing_pool(&pool)?;
        let result = self.price(
            state,
            source,
            target,
            target_is_network,
            amount,
            by_source_amount,
        )?;
        let quote = result.quote(by_source_amount);
        debug!(
            source = %source,
            target = %target,
            amount = %amount,
            by_source_amount,
            quoted = %quote.amount,
            trading_fee = %quote.trading_fee_amount,
            network_fee = %quote.network_fee_amount,
            "Trade quoted"
        );
        Ok(quote)
    }

    /// Computes the complete effect of a single-hop trade without applying it.
    pub fn prepare_trade(
        &self,
        source: &Token,
        target: &Token,
        amount: U256,
        by_source_amount: bool,
        now: u64,
    ) -> Result<TradeEffect> {
        let (pool, target_is_network) = self.hop_pool(source, target, amount)?;
        let before = self.existing_pool(&pool)?;
        let result = self.price(
            before,
            source,
            target,
            target_is_network,
            amount,
            by_source_amount,
        )?;

        // the trading fee stays in the curve; the net amount and the network
        // fee leave it
        let outflow = checked_add(result.target_amount, result.network_fee_amount)?;
        let mut after = before.clone();
        let liquidity = &mut after.liquidity;
        let master_fee = if target_is_network {
            liquidity.base_token_trading_liquidity =
                checked_add(liquidity.base_token_trading_liquidity, result.source_amount)?;
            liquidity.network_token_trading_liquidity =
                checked_sub(liquidity.network_token_trading_liquidity, outflow)?;
            result.trading_fee_amount
        } else {
            liquidity.network_token_trading_liquidity =
                checked_add(liquidity.network_token_trading_liquidity, result.source_amount)?;
            liquidity.base_token_trading_liquidity =
                checked_sub(liquidity.base_token_trading_liquidity, outflow)?;
            liquidity.staked_balance =
                checked_add(liquidity.staked_balance, result.trading_fee_amount)?;
            U256::zero()
        };
        after.average_rate = before.average_rate.updated(
            &before.spot_rate()?,
            self.settings.average_rate_weight_ppm,
            now,
        )?;

        Ok(TradeEffect {
            pool,
            before: before.clone(),
            after,
            master_fee,
            result,
        })
    }

    /// Commits prepared trades all at once.
    ///
    /// Every effect is validated before anything is written: each must
    /// target a different pool, and each pool must still be in the state
    /// the effect was computed against.
    ///
    /// # Errors
    ///
    /// - [`LiquidityError::InvalidTokens`] when two effects share a pool
    /// - [`LiquidityError::StaleQuote`] when a pool changed since preparation
    pub fn apply_trades(
        &mut self,
        master: &mut MasterPool,
        effects: Vec<TradeEffect>,
    ) -> Result<Vec<TradeResult>> {
        let mut seen = BTreeSet::new();
        let mut master_fees = Vec::with_capacity(effects.len());
        let mut network_fees: BTreeMap<Token, U256> = BTreeMap::new();
        for effect in &effects {
            if !seen.insert(effect.pool) {
                return Err(LiquidityError::InvalidTokens);
            }
            if self.existing_pool(&effect.pool)? != &effect.before {
                return Err(LiquidityError::StaleQuote);
            }
            master_fees.push((effect.pool, effect.master_fee));

            let fee_token = effect.result.target_token;
            let accrued = network_fees
                .entry(fee_token)
                .or_insert_with(|| self.network_fees(&fee_token));
            *accrued = checked_add(*accrued, effect.result.network_fee_amount)?;
        }
        master.check_fee_accrual(&master_fees)?;

        let mut results = Vec::with_capacity(effects.len());
        for effect in effects {
            master.accrue_fees(&effect.pool, effect.master_fee);
            self.pools.insert(effect.pool, effect.after);
            let result = effect.result;
            info!(
                source = %result.source_token,
                target = %result.target_token,
                source_amount = %result.source_amount,
                target_amount = %result.target_amount,
                trading_fee = %result.trading_fee_amount,
                network_fee = %result.network_fee_amount,
                "Trade executed"
            );
            results.push(result);
        }
        self.network_fees.extend(network_fees);
        Ok(results)
    }

    /// Prices and executes a single-hop trade.
    pub fn trade(
        &mut self,
        master: &mut MasterPool,
        source: &Token,
        target: &Token,
        amount: U256,
        by_source_amount: bool,
        now: u64,
    ) -> Result<TradeResult> {
        let effect = self.prepare_trade(source, target, amount, by_source_amount, now)?;
        self.apply_trades(master, vec![effect])?
            .into_iter()
            .next()
            .ok_or(LiquidityError::NotFound)
    }

    /// Deposits `amount` base tokens on behalf of `provider`.
    ///
    /// Pool tokens are minted at the current equity rate. When the pool is
    /// tradeable, the curve grows at the spot rate as far as the master pool
    /// can fund the network side.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::DeviationTooHigh`] when the spot rate strays from
    /// the average rate by more than the configured tolerance.
    pub fn deposit_for(
        &mut self,
        master: &mut MasterPool,
        provider: &Address,
        token: &Token,
        amount: U256,
        now: u64,
    ) -> Result<DepositAmounts> {
        if amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }
        let pool = self.existing_pool(token)?;
        let pool_token_amount = pool.underlying_to_pool_token(amount)?;
        if pool_token_amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }

        let mut after = pool.clone();
        after.pool_token_supply = checked_add(pool.pool_token_supply, pool_token_amount)?;
        after.liquidity.staked_balance = checked_add(pool.liquidity.staked_balance, amount)?;

        let mut base_increase = U256::zero();
        let mut network_increase = U256::zero();
        if pool.trading_enabled {
            let spot = pool.spot_rate()?;
            let average = pool.average_rate.rate;
            if !spot.is_within_tolerance(&average, self.settings.average_rate_max_deviation_ppm) {
                warn!(
                    token = %token,
                    spot = %spot,
                    average = %average,
                    "Deposit rejected: spot rate deviates from average"
                );
                return Err(LiquidityError::DeviationTooHigh);
            }
            network_increase = spot
                .mul_amount(amount, Rounding::Down)?
                .min(master.available_liquidity(token, now)?);
            base_increase = spot.div_amount(network_increase, Rounding::Down)?;
            if base_increase.is_zero() {
                network_increase = U256::zero();
            }
            after.liquidity.base_token_trading_liquidity =
                checked_add(pool.liquidity.base_token_trading_liquidity, base_increase)?;
            after.liquidity.network_token_trading_liquidity =
                checked_add(pool.liquidity.network_token_trading_liquidity, network_increase)?;
        }

        if !network_increase.is_zero() {
            master.request_funding(token, network_increase, now)?;
        }
        self.pools.insert(*token, after);

        info!(
            provider = %provider,
            token = %token,
            amount = %amount,
            pool_tokens = %pool_token_amount,
            base_increase = %base_increase,
            network_increase = %network_increase,
            "Liquidity deposited"
        );
        Ok(DepositAmounts {
            pool_token_amount,
            base_token_trading_liquidity_increase: base_increase,
            network_token_trading_liquidity_increase: network_increase,
        })
    }

    /// Burns `pool_token_amount` pool tokens and returns the reserve tokens
    /// they were worth, rounded down.
    ///
    /// Trading liquidity shrinks in proportion and the matching network
    /// tokens go back to the master pool. When the network side would drop
    /// below the minimum liquidity for trading, trading is disabled.
    pub fn withdraw(
        &mut self,
        master: &mut MasterPool,
        pool_token: &Token,
        pool_token_amount: U256,
        now: u64,
    ) -> Result<U256> {
        if pool_token_amount.is_zero() {
            return Err(LiquidityError::ZeroValue);
        }
        let token = self
            .reserve_token(pool_token)
            .ok_or(LiquidityError::InvalidToken)?;
        let pool = self.existing_pool(&token)?;
        if pool_token_amount > pool.pool_token_supply {
            return Err(LiquidityError::InvalidAmount);
        }

        let supply = pool.pool_token_supply;
        let reserve_amount = pool.pool_token_to_underlying(pool_token_amount)?;
        let liquidity = pool.liquidity;
        let base_decrease = mul_div(
            liquidity.base_token_trading_liquidity,
            pool_token_amount,
            supply,
            Rounding::Down,
        )?;
        let network_decrease = mul_div(
            liquidity.network_token_trading_liquidity,
            pool_token_amount,
            supply,
            Rounding::Down,
        )?;

        let mut after = pool.clone();
        after.pool_token_supply = checked_sub(supply, pool_token_amount)?;
        after.liquidity.staked_balance = checked_sub(liquidity.staked_balance, reserve_amount)?;
        after.liquidity.base_token_trading_liquidity =
            checked_sub(liquidity.base_token_trading_liquidity, base_decrease)?;
        after.liquidity.network_token_trading_liquidity =
            checked_sub(liquidity.network_token_trading_liquidity, network_decrease)?;

        let below_minimum = after.liquidity.network_token_trading_liquidity
            < self.settings.min_liquidity_for_trading;
        if pool.trading_enabled && below_minimum {
            self.reset_trading_liquidity(master, &token, now)?;
            after.liquidity.base_token_trading_liquidity = U256::zero();
            after.liquidity.network_token_trading_liquidity = U256::zero();
            after.trading_enabled = false;
            warn!(token = %token, "Trading disabled: liquidity below minimum");
        } else if !network_decrease.is_zero() {
            master.renounce_funding(&token, network_decrease, now)?;
        }
        self.pools.insert(token, after);

        info!(
            token = %token,
            pool_tokens = %pool_token_amount,
            amount = %reserve_amount,
            "Liquidity withdrawn"
        );
        Ok(reserve_amount)
    }
}

impl ReserveValuation for PoolCollection {
    fn underlying_value(&self, pool_token: &Token, pool_token_amount: U256) -> Result<U256> {
        let token = self
            .reserve_token(pool_token)
            .ok_or(LiquidityError::InvalidToken)?;
        self.pool_token_to_underlying(&token, pool_token_amount)
    }
}
