//! Shared fixture: two tradeable pools priced at 5 network tokens per base token.

#![allow(dead_code)]

use lnet_domain::{
    AdminCapability, Address, Clock, Fraction, InMemoryPoolTokenLedger, ManualClock,
    NetworkSettings, Token, U256,
};
use lnet_network::NetworkInfo;
use lnet_pools::{MasterPool, PoolCollection};
use lnet_withdrawals::PendingWithdrawals;

pub const START: u64 = 0;
pub const BASE_LIQUIDITY: u64 = 1_000_000;
pub const NETWORK_LIQUIDITY: u64 = 5_000_000;

pub fn network_token() -> Token {
    Token::from_low_u64(0xb17)
}

pub fn token_a() -> Token {
    Token::from_low_u64(0xa)
}

pub fn token_b() -> Token {
    Token::from_low_u64(0xb)
}

pub fn provider() -> Address {
    Address::from_low_u64(0xcafe)
}

pub struct Network {
    pub admin: AdminCapability,
    pub collection: PoolCollection,
    pub master: MasterPool,
    pub pending: PendingWithdrawals,
    pub ledger: InMemoryPoolTokenLedger,
    pub clock: ManualClock,
}

impl Network {
    pub fn new(settings: NetworkSettings) -> Self {
        let admin = AdminCapability::mint(0x5eed);
        let settings = settings.with_min_liquidity_for_trading(NETWORK_LIQUIDITY);
        let mut master = MasterPool::new(
            admin.key(),
            network_token(),
            Fraction::zero(),
            &settings,
            START,
        )
        .unwrap();
        master.deposit(U256::from(NETWORK_LIQUIDITY) * 4).unwrap();

        let mut network = Self {
            collection: PoolCollection::new(admin.key(), network_token(), settings.clone())
                .unwrap(),
            pending: PendingWithdrawals::new(admin.key(), &settings).unwrap(),
            ledger: InMemoryPoolTokenLedger::new(),
            clock: ManualClock::new(START),
            master,
            admin,
        };
        for token in [token_a(), token_b()] {
            network.open_pool(token);
        }
        network
    }

    fn open_pool(&mut self, token: Token) {
        let pool_token = self
            .collection
            .create_pool(&self.admin, &mut self.master, token)
            .unwrap();
        self.deposit(token, BASE_LIQUIDITY);
        self.collection
            .enable_trading(
                &self.admin,
                &mut self.master,
                &token,
                Fraction::new(NETWORK_LIQUIDITY, BASE_LIQUIDITY).unwrap(),
                self.clock.now(),
            )
            .unwrap();
        assert_eq!(self.collection.pool_token(&token).unwrap(), pool_token);
    }

    /// Deposits for [`provider`] and credits the minted pool tokens.
    pub fn deposit(&mut self, token: Token, amount: u64) -> U256 {
        let amounts = self
            .collection
            .deposit_for(
                &mut self.master,
                &provider(),
                &token,
                U256::from(amount),
                self.clock.now(),
            )
            .unwrap();
        let pool_token = self.collection.pool_token(&token).unwrap();
        self.ledger
            .mint(pool_token, provider(), amounts.pool_token_amount)
            .unwrap();
        amounts.pool_token_amount
    }

    pub fn info(&self) -> NetworkInfo<'_> {
        NetworkInfo::builder()
            .with_network_token(network_token())
            .with_pool_collection(&self.collection)
            .with_master_pool(&self.master)
            .with_pending_withdrawals(&self.pending)
            .with_clock(&self.clock)
            .build()
            .unwrap()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new(NetworkSettings::default())
    }
}
