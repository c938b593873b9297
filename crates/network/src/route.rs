//! Trade routes between arbitrary token pairs.
//!
//! Pools only price hops against the network token. A trade between two
//! base tokens is composed of two hops through the network token: the
//! output of the first hop is the input of the second when quoting by
//! source amount, and the input of the second hop is the output the first
//! must produce when quoting by target amount.

use lnet_domain::error::{LiquidityError, Result};
use lnet_domain::token::Token;
use lnet_pools::{MasterPool, PoolCollection, TradeAmountAndFee, TradeResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Path of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeRoute {
    /// One side is the network token.
    Direct { source: Token, target: Token },
    /// Base token to base token through the network token.
    ViaNetworkToken {
        source: Token,
        network: Token,
        target: Token,
    },
}

impl TradeRoute {
    /// Picks the route for `source → target`.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InvalidTokens`] when `source == target`.
    pub fn resolve(network_token: Token, source: Token, target: Token) -> Result<Self> {
        if source == target {
            return Err(LiquidityError::InvalidTokens);
        }
        if source == network_token || target == network_token {
            Ok(TradeRoute::Direct { source, target })
        } else {
            Ok(TradeRoute::ViaNetworkToken {
                source,
                network: network_token,
                target,
            })
        }
    }

    /// `(source, target)` of every hop, in trade order.
    pub fn hops(&self) -> Vec<(Token, Token)> {
        match *self {
            TradeRoute::Direct { source, target } => vec![(source, target)],
            TradeRoute::ViaNetworkToken {
                source,
                network,
                target,
            } => vec![(source, network), (network, target)],
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, TradeRoute::Direct { .. })
    }
}

/// Quote of a whole route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub route: TradeRoute,
    pub source_amount: U256,
    pub target_amount: U256,
    /// Per-hop quotes in trade order.
    pub hops: Vec<TradeAmountAndFee>,
}

/// Quotes `route` for `amount` source tokens, feeding each hop's output
/// into the next hop.
pub fn compose_by_source(
    collection: &PoolCollection,
    route: &TradeRoute,
    amount: U256,
) -> Result<RouteQuote> {
    let mut hops = Vec::new();
    let mut hop_amount = amount;
    for (source, target) in route.hops() {
        let quote = collection.trade_amount_and_fee(&source, &target, hop_amount, true)?;
        hop_amount = quote.amount;
        hops.push(quote);
    }
    debug!(
        source_amount = %amount,
        target_amount = %hop_amount,
        hops = hops.len(),
        "Route quoted by source"
    );
    Ok(RouteQuote {
        route: *route,
        source_amount: amount,
        target_amount: hop_amount,
        hops,
    })
}

/// Quotes `route` for receiving `amount` target tokens, working backwards
/// from the last hop.
pub fn compose_by_target(
    collection: &PoolCollection,
    route: &TradeRoute,
    amount: U256,
) -> Result<RouteQuote> {
    let mut hops = Vec::new();
    let mut hop_amount = amount;
    for (source, target) in route.hops().into_iter().rev() {
        let quote = collection.trade_amount_and_fee(&source, &target, hop_amount, false)?;
        hop_amount = quote.amount;
        hops.push(quote);
    }
    hops.reverse();
    debug!(
        source_amount = %hop_amount,
        target_amount = %amount,
        hops = hops.len(),
        "Route quoted by target"
    );
    Ok(RouteQuote {
        route: *route,
        source_amount: hop_amount,
        target_amount: amount,
        hops,
    })
}

/// Executes `source → target` over its route. Every hop is priced against
/// the current state before any of them is applied, so either all hops
/// commit or none does.
pub fn execute_route(
    collection: &mut PoolCollection,
    master: &mut MasterPool,
    source: Token,
    target: Token,
    amount: U256,
    by_source_amount: bool,
    now: u64,
) -> Result<Vec<TradeResult>> {
    let route = TradeRoute::resolve(collection.network_token(), source, target)?;
    let hops = route.hops();

    let mut effects = Vec::with_capacity(hops.len());
    let mut hop_amount = amount;
    if by_source_amount {
        for (hop_source, hop_target) in &hops {
            let effect = collection.prepare_trade(hop_source, hop_target, hop_amount, true, now)?;
            hop_amount = effect.result().target_amount;
            effects.push(effect);
        }
    } else {
        for (hop_source, hop_target) in hops.iter().rev() {
            let effect =
                collection.prepare_trade(hop_source, hop_target, hop_amount, false, now)?;
            hop_amount = effect.result().source_amount;
            effects.push(effect);
        }
        effects.reverse();
    }

    let results = collection.apply_trades(master, effects)?;
    info!(
        source = %source,
        target = %target,
        hops = results.len(),
        "Route executed"
    );
    Ok(results)
}
