//! Time-locked withdrawal requests.
//!
//! Providers lock pool tokens in a request; the request becomes ready after
//! the lock duration and can be completed until the withdrawal window ends.

/// Pending withdrawals registry.
pub mod pending;
/// Withdrawal request records.
pub mod request;

pub use pending::PendingWithdrawals;
pub use request::{WithdrawalId, WithdrawalRequest, WithdrawalStatus};
