//! Command Line Interface for the liquidity network engine.
mod snapshot;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use lnet_domain::{Address, Clock, Fraction, ManualClock, NetworkSettings, SystemClock, Token, U256};
use lnet_network::NetworkInfo;
use lnet_withdrawals::WithdrawalId;
use snapshot::{Seed, Snapshot};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const STATE_VAR: &str = "LNET_STATE";
const ADMIN_SECRET_VAR: &str = "LNET_ADMIN_SECRET";

#[derive(Parser)]
#[command(name = "lnet")]
#[command(about = "Liquidity network engine CLI", long_about = None)]
struct Cli {
    /// State snapshot (defaults to $LNET_STATE)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Evaluate time-dependent views at this Unix time instead of now
    #[arg(long, global = true)]
    now: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a seeded network snapshot
    Init {
        /// Network token address
        #[arg(long)]
        network_token: Token,

        /// Reserve tokens to create pools for
        #[arg(long = "pool", required = true)]
        pools: Vec<Token>,

        /// Provider of the initial deposits
        #[arg(long)]
        provider: Address,

        /// Network tokens staked in the master pool
        #[arg(long, value_parser = parse_u256, default_value = "100000000")]
        stake: U256,

        /// Base tokens deposited in every pool
        #[arg(long, value_parser = parse_u256, default_value = "1000000")]
        deposit: U256,

        /// Initial rate as network tokens per base token, `n/d`
        #[arg(long, value_parser = parse_fraction, default_value = "1/1")]
        rate: Fraction,

        /// Master pool funding rate per second, `n/d`
        #[arg(long, value_parser = parse_fraction, default_value = "0/1")]
        funding_rate: Fraction,
    },
    /// Quote a trade
    Quote {
        #[arg(short, long)]
        source: Token,

        #[arg(short, long)]
        target: Token,

        #[arg(short, long, value_parser = parse_u256)]
        amount: U256,

        /// Treat the amount as the target amount to receive
        #[arg(long)]
        by_target: bool,
    },
    /// Show a pending withdrawal
    WithdrawalStatus {
        #[arg(long)]
        id: u64,
    },
    /// Show master pool funding for a pool
    Funding {
        #[arg(long)]
        pool: Token,
    },
    /// List pools
    Pools,
}

fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|e| format!("invalid amount {s}: {e:?}"))
}

fn parse_fraction(s: &str) -> Result<Fraction, String> {
    let (n, d) = s
        .split_once('/')
        .ok_or_else(|| format!("expected n/d, got {s}"))?;
    Fraction::new(parse_u256(n.trim())?, parse_u256(d.trim())?).map_err(|e| e.to_string())
}

fn state_path(cli: &Cli) -> Result<PathBuf> {
    cli.state
        .clone()
        .or_else(|| env::var_os(STATE_VAR).map(PathBuf::from))
        .ok_or_else(|| anyhow!("no state snapshot: pass --state or set {STATE_VAR}"))
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let clock: Box<dyn Clock> = match cli.now {
        Some(now) => Box::new(ManualClock::new(now)),
        None => Box::new(SystemClock),
    };
    let path = state_path(&cli)?;

    if let Commands::Init {
        network_token,
        pools,
        provider,
        stake,
        deposit,
        rate,
        funding_rate,
    } = &cli.command
    {
        let admin_secret = match env::var(ADMIN_SECRET_VAR) {
            Ok(secret) => secret
                .parse()
                .with_context(|| format!("{ADMIN_SECRET_VAR} must be an unsigned integer"))?,
            Err(_) => 1,
        };
        let seed = Seed {
            admin_secret,
            network_token: *network_token,
            pools: pools.clone(),
            provider: *provider,
            stake: *stake,
            deposit: *deposit,
            initial_rate: *rate,
            funding_rate: *funding_rate,
            now: clock.now(),
        };
        snapshot::seed(NetworkSettings::default(), &seed)?.save(&path)?;
        println!("✅ Seeded {} pools into {}", pools.len(), path.display());
        return Ok(());
    }

    let snapshot = Snapshot::load(&path)?;
    let info = NetworkInfo::builder()
        .with_network_token(snapshot.collection.network_token())
        .with_pool_collection(&snapshot.collection)
        .with_master_pool(&snapshot.master)
        .with_pending_withdrawals(&snapshot.withdrawals)
        .with_clock(clock.as_ref())
        .build()?;
    debug!(now = info.now(), "Network info ready");

    match &cli.command {
        Commands::Init { .. } => {}
        Commands::Quote {
            source,
            target,
            amount,
            by_target,
        } => {
            let quote = if *by_target {
                info.quote_by_target(source, target, *amount)?
            } else {
                info.quote_by_source(source, target, *amount)?
            };

            println!("\n💱 Quote {} → {}", source, target);
            println!("════════════════════════════════════");
            println!("Source amount:   {}", quote.source_amount);
            println!("Target amount:   {}", quote.target_amount);
            for (i, hop) in quote.hops.iter().enumerate() {
                println!(
                    "Hop {}:           amount {} | trading fee {} | network fee {}",
                    i + 1,
                    hop.amount,
                    hop.trading_fee_amount,
                    hop.network_fee_amount
                );
            }
            println!("════════════════════════════════════");
        }
        Commands::WithdrawalStatus { id } => {
            let id = WithdrawalId(*id);
            let Some(request) = info.withdrawal_request(id) else {
                println!("❌ Withdrawal request {id} not found");
                return Ok(());
            };
            let pending = info.pending_withdrawals();
            let status = info
                .withdrawal_status(id)
                .map(|s| s.to_string())
                .unwrap_or_default();

            println!("\n⏳ Withdrawal request {id}");
            println!("════════════════════════════════════");
            println!("Provider:        {}", request.provider);
            println!("Pool token:      {}", request.pool_token);
            println!("Pool tokens:     {}", request.pool_token_amount);
            println!("Reserve tokens:  {}", request.reserve_token_amount);
            println!("Payout now:      {}", request.payout(info.pool_collection())?);
            println!("Created at:      {}", request.created_at);
            println!("Ready at:        {}", request.ready_at(pending.lock_duration()));
            println!(
                "Expires at:      {}",
                request.expires_at(pending.lock_duration(), pending.withdrawal_window_duration())
            );
            println!("Status:          {status}");
            println!("════════════════════════════════════");
        }
        Commands::Funding { pool } => {
            let master = info.master_pool();
            println!("\n🏦 Funding for {pool}");
            println!("════════════════════════════════════");
            println!("Lent:            {}", master.current_pool_funding(pool));
            println!("Limit:           {}", master.funding_limit(pool));
            println!("Available:       {}", info.available_funding(pool)?);
            println!("Total lent:      {}", master.total_funding());
            println!("Staked:          {}", master.staked_balance());
            println!("Growth factor:   {}", info.growth_factor()?);
            println!("════════════════════════════════════");
        }
        Commands::Pools => {
            println!(
                "{:<44} | {:<8} | {:<8} | {:<20} | {:<20} | {:<12}",
                "Token", "Trading", "Fee ppm", "Base liquidity", "Network liquidity", "Spot rate"
            );
            println!("{}", "-".repeat(124));
            for (token, pool) in info.pool_collection().pools() {
                let spot = pool
                    .spot_rate()
                    .ok()
                    .and_then(|rate| rate.to_decimal())
                    .map(|rate| rate.round_dp(6).to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<44} | {:<8} | {:<8} | {:<20} | {:<20} | {:<12}",
                    token.to_string(),
                    pool.trading_enabled,
                    pool.trading_fee_ppm,
                    pool.liquidity.base_token_trading_liquidity.to_string(),
                    pool.liquidity.network_token_trading_liquidity.to_string(),
                    spot
                );
            }
        }
    }

    Ok(())
}
