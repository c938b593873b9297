//! Withdrawal request records.

use lnet_domain::error::Result;
use lnet_domain::ledger::ReserveValuation;
use lnet_domain::token::{Address, Token};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WithdrawalId(pub u64);

impl fmt::Display for WithdrawalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A locked pool-token claim waiting to be redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub provider: Address,
    pub pool_token: Token,
    pub pool_token_amount: U256,
    /// Reserve value of the claim when the request was created.
    pub reserve_token_amount: U256,
    pub created_at: u64,
}

/// Where a live request stands at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    /// Still inside the lock period.
    Locked,
    /// Inside the withdrawal window.
    Ready,
    /// The window has passed; the request must be reinitiated.
    Expired,
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalStatus::Locked => write!(f, "locked"),
            WithdrawalStatus::Ready => write!(f, "ready"),
            WithdrawalStatus::Expired => write!(f, "expired"),
        }
    }
}

impl WithdrawalRequest {
    /// First second the request can be completed.
    pub fn ready_at(&self, lock_duration: u64) -> u64 {
        self.created_at.saturating_add(lock_duration)
    }

    /// First second the request is expired.
    pub fn expires_at(&self, lock_duration: u64, window_duration: u64) -> u64 {
        self.ready_at(lock_duration).saturating_add(window_duration)
    }

    pub fn status(&self, lock_duration: u64, window_duration: u64, now: u64) -> WithdrawalStatus {
        if now < self.ready_at(lock_duration) {
            WithdrawalStatus::Locked
        } else if now < self.expires_at(lock_duration, window_duration) {
            WithdrawalStatus::Ready
        } else {
            WithdrawalStatus::Expired
        }
    }

    /// Reserve tokens to pay out: the value snapshotted at creation, or the
    /// current value if the pool lost value since.
    pub fn payout(&self, valuation: &impl ReserveValuation) -> Result<U256> {
        let current = valuation.underlying_value(&self.pool_token, self.pool_token_amount)?;
        Ok(current.min(self.reserve_token_amount))
    }
}
