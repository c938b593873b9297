mod common;

use common::{Network, network_token, token_a, token_b};
use lnet_domain::{Clock, LiquidityError, U256};
use lnet_network::{TradeRoute, compose_by_source, execute_route};

#[test]
fn test_single_hop_quote_is_deterministic() {
    let network = Network::default();
    let quote = |n: &Network| {
        n.collection
            .trade_amount_and_fee(&token_a(), &network_token(), U256::from(1000u64), true)
            .unwrap()
    };

    // gross = 5_000_000 * 1000 / 1_001_000 = 4995, fee = ceil(9.99) = 10
    let first = quote(&network);
    assert_eq!(first.amount, U256::from(4985u64));
    assert_eq!(first.trading_fee_amount, U256::from(8u64));
    assert_eq!(first.network_fee_amount, U256::from(2u64));

    for _ in 0..5 {
        assert_eq!(quote(&network), first);
    }
}

#[test]
fn test_two_hop_quote_feeds_first_output_into_second_hop() {
    let network = Network::default();
    let info = network.info();

    let quote = info
        .quote_by_source(&token_a(), &token_b(), U256::from(1000u64))
        .unwrap();
    assert!(!quote.route.is_direct());
    assert_eq!(quote.hops.len(), 2);
    assert_eq!(quote.hops[0].amount, U256::from(4985u64));
    // 1_000_000 * 4985 / 5_004_985 = 996, fee = ceil(1.992) = 2
    assert_eq!(quote.target_amount, U256::from(994u64));

    assert_eq!(
        info.trade_target_amount(&token_a(), &token_b(), U256::from(1000u64))
            .unwrap(),
        U256::from(994u64)
    );
}

#[test]
fn test_two_hop_source_amount_covers_target() {
    let network = Network::default();
    let info = network.info();

    let source_amount = info
        .trade_source_amount(&token_a(), &token_b(), U256::from(994u64))
        .unwrap();
    assert!(source_amount <= U256::from(1000u64));
    let received = info
        .trade_target_amount(&token_a(), &token_b(), source_amount)
        .unwrap();
    assert!(received >= U256::from(994u64));
}

#[test]
fn test_execute_route_commits_both_hops() {
    let mut network = Network::default();
    let route = TradeRoute::resolve(network_token(), token_a(), token_b()).unwrap();
    let quoted = compose_by_source(&network.collection, &route, U256::from(1000u64)).unwrap();

    let now = network.clock.now();
    let results = execute_route(
        &mut network.collection,
        &mut network.master,
        token_a(),
        token_b(),
        U256::from(1000u64),
        true,
        now,
    )
    .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[1].target_amount, quoted.target_amount);
    assert_eq!(results[0].target_amount, results[1].source_amount);

    let a = network.collection.trading_liquidity(&token_a()).unwrap();
    let b = network.collection.trading_liquidity(&token_b()).unwrap();
    assert_eq!(a.base_token_trading_liquidity, U256::from(1_001_000u64));
    assert_eq!(
        b.network_token_trading_liquidity,
        U256::from(5_000_000u64 + 4985)
    );
}

#[test]
fn test_execute_route_is_all_or_nothing() {
    let mut network = Network::default();
    let now = network.clock.now();
    network
        .collection
        .disable_trading(&network.admin, &mut network.master, &token_b(), now)
        .unwrap();
    let before = network.collection.trading_liquidity(&token_a()).unwrap();

    let result = execute_route(
        &mut network.collection,
        &mut network.master,
        token_a(),
        token_b(),
        U256::from(1000u64),
        true,
        now,
    );
    assert_eq!(result, Err(LiquidityError::InvalidToken));
    assert_eq!(
        network.collection.trading_liquidity(&token_a()).unwrap(),
        before
    );
}

#[test]
fn test_execute_route_by_target_delivers_requested_amount() {
    let mut network = Network::default();
    let now = network.clock.now();
    let results = execute_route(
        &mut network.collection,
        &mut network.master,
        token_a(),
        token_b(),
        U256::from(500u64),
        false,
        now,
    )
    .unwrap();
    assert_eq!(results[1].target_amount, U256::from(500u64));
    assert_eq!(results[0].target_amount, results[1].source_amount);
}

#[test]
fn test_trade_fees_reach_stakers_and_protocol() {
    let mut network = Network::default();
    let staked = network.master.staked_balance();
    let now = network.clock.now();
    network
        .collection
        .trade(
            &mut network.master,
            &token_a(),
            &network_token(),
            U256::from(1000u64),
            true,
            now,
        )
        .unwrap();
    assert_eq!(network.master.staked_balance(), staked + 8);
    assert_eq!(
        network.collection.network_fees(&network_token()),
        U256::from(2u64)
    );
}
