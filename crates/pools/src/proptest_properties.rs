//! Property-based tests for the pool collection.
//!
//! 1. **No value creation**: the curve product never decreases after a trade.
//! 2. **Fee consistency**: fee parts add up to the charged fee; a zero
//!    trading fee charges nothing.
//! 3. **Round-trip quoting**: the source amount quoted for a target amount
//!    never exceeds the source amount that produced it.
//! 4. **Liquidity conservation**: deposit then withdraw never pays out more.

use proptest::prelude::*;

use crate::collection::PoolCollection;
use crate::master_pool::MasterPool;
use lnet_domain::access::AdminCapability;
use lnet_domain::math::{Fraction, GROWTH_FACTOR_SCALE};
use lnet_domain::settings::NetworkSettings;
use lnet_domain::token::{Address, Token};
use primitive_types::U256;

const NOW: u64 = 10_000;

fn network_token() -> Token {
    Token::from_low_u64(0xb17)
}

fn base_token() -> Token {
    Token::from_low_u64(0xa)
}

fn provider() -> Address {
    Address::from_low_u64(0xcafe)
}

/// Tradeable pool with the given curve balances and trading fee.
fn make_pool(base: u64, network: u64, fee_ppm: u32) -> (PoolCollection, MasterPool) {
    let admin = AdminCapability::mint(1);
    let settings = NetworkSettings::default().with_min_liquidity_for_trading(network);
    let Ok(mut master) = MasterPool::new(
        admin.key(),
        network_token(),
        Fraction::zero(),
        &settings,
        NOW,
    ) else {
        panic!("valid master pool");
    };
    let Ok(_) = master.deposit(U256::from(network) * 4) else {
        panic!("stake accepted");
    };
    let Ok(mut collection) = PoolCollection::new(admin.key(), network_token(), settings) else {
        panic!("valid collection");
    };
    let Ok(_) = collection.create_pool(&admin, &mut master, base_token()) else {
        panic!("pool created");
    };
    let Ok(_) = collection.deposit_for(
        &mut master,
        &provider(),
        &base_token(),
        U256::from(base),
        NOW,
    ) else {
        panic!("deposit accepted");
    };
    let Ok(rate) = Fraction::new(network, base) else {
        panic!("valid rate");
    };
    let Ok(()) = collection.enable_trading(&admin, &mut master, &base_token(), rate, NOW) else {
        panic!("trading enabled");
    };
    let Ok(()) = collection.set_trading_fee_ppm(&admin, &base_token(), fee_ppm) else {
        panic!("fee accepted");
    };
    (collection, master)
}

fn curve_product(collection: &PoolCollection) -> primitive_types::U512 {
    let Ok(liquidity) = collection.trading_liquidity(&base_token()) else {
        panic!("pool exists");
    };
    liquidity
        .base_token_trading_liquidity
        .full_mul(liquidity.network_token_trading_liquidity)
}

proptest! {
    #[test]
    fn prop_trade_never_decreases_curve_product(
        base in 1_000u64..1_000_000_000_000,
        network in 1_000u64..1_000_000_000_000,
        amount in 1u64..1_000_000_000,
        fee_ppm in 0u32..=100_000,
        to_network in any::<bool>(),
        by_source in any::<bool>(),
    ) {
        let (mut collection, mut master) = make_pool(base, network, fee_ppm);
        let (source, target) = if to_network {
            (base_token(), network_token())
        } else {
            (network_token(), base_token())
        };
        let k_before = curve_product(&collection);
        if collection
            .trade(&mut master, &source, &target, U256::from(amount), by_source, NOW + 1)
            .is_ok()
        {
            prop_assert!(curve_product(&collection) >= k_before);
        }
    }

    #[test]
    fn prop_fee_parts_add_up(
        base in 1_000u64..1_000_000_000_000,
        network in 1_000u64..1_000_000_000_000,
        amount in 1u64..1_000_000_000,
        fee_ppm in 0u32..=100_000,
    ) {
        let (collection, _) = make_pool(base, network, fee_ppm);
        let Ok(effect) = collection.prepare_trade(
            &base_token(),
            &network_token(),
            U256::from(amount),
            true,
            NOW,
        ) else {
            return Ok(());
        };
        let result = effect.result();
        let gross = result.target_amount + result.fee_charged();
        let expected_fee = lnet_domain::fees::fee_on_output(gross, fee_ppm).unwrap_or_default();
        prop_assert!(result.trading_fee_amount + result.network_fee_amount <= expected_fee);
        if fee_ppm == 0 {
            prop_assert!(result.trading_fee_amount.is_zero());
            prop_assert!(result.network_fee_amount.is_zero());
        }
    }

    #[test]
    fn prop_round_trip_quote_is_conservative(
        base in 1_000u64..1_000_000_000_000,
        network in 1_000u64..1_000_000_000_000,
        amount in 1u64..1_000_000_000,
        fee_ppm in 0u32..=100_000,
    ) {
        let (collection, _) = make_pool(base, network, fee_ppm);
        let (source, target) = (base_token(), network_token());
        let forward = collection.trade_amount_and_fee(&source, &target, U256::from(amount), true);
        let Ok(forward) = forward else {
            return Ok(());
        };
        prop_assume!(!forward.amount.is_zero());

        let backward = collection.trade_amount_and_fee(&source, &target, forward.amount, false);
        let Ok(backward) = backward else {
            panic!("a reachable output can be quoted by target");
        };
        prop_assert!(backward.amount <= U256::from(amount));

        let again = collection.trade_amount_and_fee(&source, &target, backward.amount, true);
        let Ok(again) = again else {
            panic!("the quoted source amount can be traded");
        };
        prop_assert!(again.amount >= forward.amount);
    }

    #[test]
    fn prop_deposit_then_withdraw_pays_no_more(
        base in 1_000u64..1_000_000_000_000,
        network in 1_000u64..1_000_000_000_000,
        amount in 1u64..1_000_000_000,
    ) {
        let (mut collection, mut master) = make_pool(base, network, 2_000);
        let Ok(deposit) = collection.deposit_for(
            &mut master,
            &provider(),
            &base_token(),
            U256::from(amount),
            NOW,
        ) else {
            return Ok(());
        };
        let Ok(pool_token) = collection.pool_token(&base_token()) else {
            panic!("pool exists");
        };
        let withdrawn =
            collection.withdraw(&mut master, &pool_token, deposit.pool_token_amount, NOW);
        if let Ok(paid) = withdrawn {
            prop_assert!(paid <= U256::from(amount));
        }
    }

    #[test]
    fn prop_growth_factor_never_regresses(
        n in 0u64..1_000,
        d in 1u64..1_000_000,
        t1 in 0u64..1_000_000,
        dt in 0u64..1_000_000,
    ) {
        let admin = AdminCapability::mint(1);
        let Ok(rate) = Fraction::new(n, d) else {
            panic!("valid rate");
        };
        let Ok(mut master) = MasterPool::new(
            admin.key(),
            network_token(),
            rate,
            &NetworkSettings::default(),
            0,
        ) else {
            panic!("valid master pool");
        };
        let Ok(first) = master.update_growth_factor(t1) else {
            panic!("growth factor computed");
        };
        let Ok(second) = master.update_growth_factor(t1 + dt) else {
            panic!("growth factor computed");
        };
        prop_assert!(first >= U256::from(GROWTH_FACTOR_SCALE));
        prop_assert!(second >= first);
    }
}
