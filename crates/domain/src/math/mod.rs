//! Deterministic fixed-point arithmetic used by every pricing formula.
//!
//! No floating point: each operation returns an exact (or explicitly
//! rounded) result or fails with [`LiquidityError::Overflow`] /
//! [`LiquidityError::DivisionByZero`].
//!
//! [`LiquidityError::Overflow`]: crate::error::LiquidityError::Overflow
//! [`LiquidityError::DivisionByZero`]: crate::error::LiquidityError::DivisionByZero

pub mod checked;
pub mod compound;
pub mod constant_product;
pub mod fraction;

pub use checked::{PPM_RESOLUTION, Rounding, mul_div, mul_ppm};
pub use compound::{GROWTH_FACTOR_SCALE, compound};
pub use fraction::Fraction;
