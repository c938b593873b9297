//! Persisted engine state.

use anyhow::{Context, Result};
use lnet_domain::{
    AdminCapability, Address, Fraction, InMemoryPoolTokenLedger, NetworkSettings, Token, U256,
};
use lnet_pools::{MasterPool, PoolCollection};
use lnet_withdrawals::PendingWithdrawals;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Everything the engine persists: the pools, the master pool, the pending
/// withdrawals and the pool-token balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub collection: PoolCollection,
    pub master: MasterPool,
    pub withdrawals: PendingWithdrawals,
    #[serde(default)]
    pub ledger: InMemoryPoolTokenLedger,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        snapshot
            .collection
            .settings()
            .validate()
            .with_context(|| format!("invalid settings in snapshot {}", path.display()))?;
        info!(path = %path.display(), pools = snapshot.collection.pool_count(), "Snapshot loaded");
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("creating snapshot {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("serializing snapshot {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flushing snapshot {}", path.display()))?;
        info!(path = %path.display(), "Snapshot written");
        Ok(())
    }
}

/// Parameters of a freshly seeded network.
pub struct Seed {
    pub admin_secret: u64,
    pub network_token: Token,
    pub pools: Vec<Token>,
    pub provider: Address,
    pub stake: U256,
    pub deposit: U256,
    pub initial_rate: Fraction,
    pub funding_rate: Fraction,
    pub now: u64,
}

/// Builds a network with the given pools, each funded by `provider` and
/// opened for trading at `initial_rate`.
pub fn seed(settings: NetworkSettings, seed: &Seed) -> Result<Snapshot> {
    let admin = AdminCapability::mint(seed.admin_secret);
    let mut master = MasterPool::new(
        admin.key(),
        seed.network_token,
        seed.funding_rate,
        &settings,
        seed.now,
    )?;
    master.deposit(seed.stake)?;

    let mut collection = PoolCollection::new(admin.key(), seed.network_token, settings.clone())?;
    let withdrawals = PendingWithdrawals::new(admin.key(), &settings)?;
    let mut ledger = InMemoryPoolTokenLedger::new();

    for token in &seed.pools {
        let pool_token = collection.create_pool(&admin, &mut master, *token)?;
        let deposit =
            collection.deposit_for(&mut master, &seed.provider, token, seed.deposit, seed.now)?;
        ledger.mint(pool_token, seed.provider, deposit.pool_token_amount)?;
        collection
            .enable_trading(&admin, &mut master, token, seed.initial_rate, seed.now)
            .with_context(|| format!("enabling trading for {token}"))?;
    }

    Ok(Snapshot {
        collection,
        master,
        withdrawals,
        ledger,
    })
}
