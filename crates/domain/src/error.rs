//! Error taxonomy shared by every engine component.
//!
//! Every public operation either commits its state change and returns a
//! typed value, or fails with one of these variants and leaves all state
//! untouched.

/// Result alias used across the liquidity engine.
pub type Result<T> = std::result::Result<T, LiquidityError>;

/// Errors surfaced by the liquidity engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LiquidityError {
    /// A collaborator reference or token address is missing or zero.
    #[error("invalid address: {0}")]
    InvalidAddress(&'static str),
    /// The token does not reference a known pool.
    #[error("invalid token")]
    InvalidToken,
    /// Source and target tokens are identical or otherwise incompatible.
    #[error("invalid tokens")]
    InvalidTokens,
    /// A required amount is zero.
    #[error("zero value")]
    ZeroValue,
    /// An amount is zero or exceeds what the caller holds.
    #[error("invalid amount")]
    InvalidAmount,
    /// Arithmetic result does not fit the target type.
    #[error("overflow: {0}")]
    Overflow(&'static str),
    /// Arithmetic result would be negative.
    #[error("underflow: {0}")]
    Underflow(&'static str),
    /// Division by a zero denominator.
    #[error("division by zero")]
    DivisionByZero,
    /// Spot rate deviates from the average rate beyond the tolerance.
    #[error("spot rate deviation too high")]
    DeviationTooHigh,
    /// Not enough liquidity to serve the request.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    /// Fee value outside `0..=1_000_000` ppm.
    #[error("invalid fee")]
    InvalidFee,
    /// Rate fraction is zero or malformed.
    #[error("invalid rate")]
    InvalidRate,
    /// Entity is already registered.
    #[error("already exists")]
    AlreadyExists,
    /// Withdrawal request is still locked.
    #[error("withdrawal not ready")]
    WithdrawalNotReady,
    /// Withdrawal window has passed.
    #[error("withdrawal request expired")]
    Expired,
    /// Caller is not allowed to perform the operation.
    #[error("unauthorized")]
    Unauthorized,
    /// A prepared trade no longer matches the pool it was computed against.
    #[error("stale quote")]
    StaleQuote,
    /// Entity does not exist.
    #[error("not found")]
    NotFound,
}
