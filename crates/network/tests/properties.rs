mod common;

use common::{Network, token_a, token_b};
use lnet_domain::{Clock, U256};
use lnet_network::execute_route;
use proptest::prelude::*;

fn curve_product(network: &Network, token: &lnet_domain::Token) -> primitive_types::U512 {
    let liquidity = network.collection.trading_liquidity(token).unwrap();
    liquidity
        .base_token_trading_liquidity
        .full_mul(liquidity.network_token_trading_liquidity)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_two_hop_round_trip_is_conservative(amount in 1u64..500_000) {
        let network = Network::default();
        let info = network.info();
        let quoted = info.trade_target_amount(&token_a(), &token_b(), U256::from(amount));
        let Ok(received) = quoted else {
            return Ok(());
        };
        prop_assume!(!received.is_zero());

        let Ok(needed) = info.trade_source_amount(&token_a(), &token_b(), received) else {
            panic!("a reachable output can be quoted by target");
        };
        prop_assert!(needed <= U256::from(amount));
    }

    #[test]
    fn prop_route_execution_creates_no_value(
        amount in 1u64..500_000,
        by_source in any::<bool>(),
    ) {
        let mut network = Network::default();
        let k_a = curve_product(&network, &token_a());
        let k_b = curve_product(&network, &token_b());
        let now = network.clock.now();

        if execute_route(
            &mut network.collection,
            &mut network.master,
            token_a(),
            token_b(),
            U256::from(amount),
            by_source,
            now,
        )
        .is_ok()
        {
            prop_assert!(curve_product(&network, &token_a()) >= k_a);
            prop_assert!(curve_product(&network, &token_b()) >= k_b);
        }
    }
}
