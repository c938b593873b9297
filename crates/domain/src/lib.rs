//! Core domain types for the liquidity network engine.
//!
//! This crate provides the pieces every engine component shares:
//! - Fixed-point math: fractions, checked mul-div, rounding, compounding
//! - Constant product curve formulas and fee helpers
//! - Token and address identifiers
//! - The error taxonomy
//! - Network settings, capability tokens and the clock
//! - Interfaces to the external pool-token ledger

/// Capability tokens for privileged configuration.
pub mod access;
/// Shared time source.
pub mod clock;
/// Error taxonomy.
pub mod error;
/// Fee helpers.
pub mod fees;
/// External collaborator interfaces.
pub mod ledger;
/// Fixed-point math.
pub mod math;
/// Network-wide configuration.
pub mod settings;
/// Token and address identifiers.
pub mod token;

pub use primitive_types::U256;

pub use access::{AdminCapability, CapabilityKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LiquidityError, Result};
pub use fees::FeeSplit;
pub use ledger::{InMemoryPoolTokenLedger, PoolTokenLedger, ReserveValuation};
pub use math::{Fraction, Rounding};
pub use settings::NetworkSettings;
pub use token::{Address, Token};
