//! Exact rational numbers `{n, d}` over `U256`.
//!
//! Comparison and equality are by value (cross-multiplication in 512 bits),
//! so `1/2 == 2/4`. Operations whose exact result would need more than 256
//! bits per component are narrowed by dropping the same number of low bits
//! from numerator and denominator; this is the only precision loss a
//! fraction ever suffers and it never changes which side of 1 a rate lies on.

use crate::error::{LiquidityError, Result};
use crate::math::checked::{PPM_RESOLUTION, Rounding, mul_div};
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A non-negative rational number with a strictly positive denominator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawFraction")]
pub struct Fraction {
    n: U256,
    d: U256,
}

/// Wire form of a [`Fraction`], validated on the way in.
#[derive(Deserialize)]
struct RawFraction {
    n: U256,
    d: U256,
}

impl TryFrom<RawFraction> for Fraction {
    type Error = LiquidityError;

    fn try_from(raw: RawFraction) -> Result<Self> {
        Self::new(raw.n, raw.d)
    }
}

impl Fraction {
    /// Builds `n / d`.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::DivisionByZero`] if `d` is zero.
    pub fn new(n: impl Into<U256>, d: impl Into<U256>) -> Result<Self> {
        let d = d.into();
        if d.is_zero() {
            return Err(LiquidityError::DivisionByZero);
        }
        Ok(Self { n: n.into(), d })
    }

    pub fn n(&self) -> U256 {
        self.n
    }

    pub fn d(&self) -> U256 {
        self.d
    }

    pub fn zero() -> Self {
        Self {
            n: U256::zero(),
            d: U256::one(),
        }
    }

    pub fn one() -> Self {
        Self {
            n: U256::one(),
            d: U256::one(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.n.is_zero()
    }

    /// A usable rate: both components non-zero.
    pub fn is_positive(&self) -> bool {
        !self.n.is_zero() && !self.d.is_zero()
    }

    /// Narrows a 512-bit fraction into 256-bit components.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::DivisionByZero`] for a zero denominator and
    /// [`LiquidityError::Overflow`] when the value itself exceeds `2^256`.
    pub fn from_wide(n: U512, d: U512) -> Result<Self> {
        if d.is_zero() {
            return Err(LiquidityError::DivisionByZero);
        }
        let bits = n.bits().max(d.bits());
        let shift = bits.saturating_sub(256);
        let (n, d) = (n >> shift, d >> shift);
        if d.is_zero() {
            return Err(LiquidityError::Overflow("fraction exceeds 256 bits"));
        }
        Ok(Self {
            n: U256::try_from(n).map_err(|_| LiquidityError::Overflow("fraction numerator"))?,
            d: U256::try_from(d).map_err(|_| LiquidityError::Overflow("fraction denominator"))?,
        })
    }

    /// `amount * n / d`.
    pub fn mul_amount(&self, amount: U256, rounding: Rounding) -> Result<U256> {
        mul_div(amount, self.n, self.d, rounding)
    }

    /// `amount * d / n`, i.e. `amount` divided by this fraction.
    pub fn div_amount(&self, amount: U256, rounding: Rounding) -> Result<U256> {
        mul_div(amount, self.d, self.n, rounding)
    }

    /// `d / n`.
    pub fn inverse(&self) -> Result<Self> {
        Self::new(self.d, self.n)
    }

    pub fn checked_mul(&self, other: &Fraction) -> Result<Self> {
        Self::from_wide(self.n.full_mul(other.n), self.d.full_mul(other.d))
    }

    pub fn checked_div(&self, other: &Fraction) -> Result<Self> {
        if other.n.is_zero() {
            return Err(LiquidityError::DivisionByZero);
        }
        Self::from_wide(self.n.full_mul(other.d), self.d.full_mul(other.n))
    }

    /// Weighted average `self * w + other * (1 - w)` with `w` in ppm.
    ///
    /// # Errors
    ///
    /// [`LiquidityError::InvalidFee`] when `weight_ppm` exceeds the ppm
    /// resolution.
    pub fn weighted_average(&self, other: &Fraction, weight_ppm: u32) -> Result<Self> {
        if weight_ppm > PPM_RESOLUTION {
            return Err(LiquidityError::InvalidFee);
        }
        let lhs = self.n.full_mul(other.d);
        let rhs = other.n.full_mul(self.d);
        let den = self.d.full_mul(other.d);

        // leave room for the ppm factor and the final addition
        let shift = max_bits(&[lhs, rhs, den]).saturating_sub(512 - 22);
        let (lhs, rhs, den) = (lhs >> shift, rhs >> shift, den >> shift);
        if den.is_zero() {
            return Err(LiquidityError::Overflow("weighted average"));
        }

        let w = U512::from(weight_ppm);
        let rest = U512::from(PPM_RESOLUTION - weight_ppm);
        let n = lhs * w + rhs * rest;
        let d = den * U512::from(PPM_RESOLUTION);
        Self::from_wide(n, d)
    }

    /// Whether `self` lies within `max_deviation_ppm` of `reference`,
    /// relative to `reference`.
    pub fn is_within_tolerance(&self, reference: &Fraction, max_deviation_ppm: u32) -> bool {
        let lhs = self.n.full_mul(reference.d);
        let rhs = reference.n.full_mul(self.d);

        let shift = max_bits(&[lhs, rhs]).saturating_sub(512 - 22);
        let (lhs, rhs) = (lhs >> shift, rhs >> shift);

        let diff = if lhs > rhs { lhs - rhs } else { rhs - lhs };
        diff * U512::from(PPM_RESOLUTION) <= rhs * U512::from(max_deviation_ppm)
    }

    /// Lossy decimal view, for display and logging only.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let bits = self.n.bits().max(self.d.bits());
        let shift = bits.saturating_sub(96);
        let (n, d) = (self.n >> shift, self.d >> shift);
        if d.is_zero() {
            return None;
        }
        let n = Decimal::from_u128(n.low_u128())?;
        let d = Decimal::from_u128(d.low_u128())?;
        n.checked_div(d)
    }
}

fn max_bits(values: &[U512]) -> usize {
    values.iter().map(|v| v.bits()).max().unwrap_or(0)
}

impl Default for Fraction {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.n.full_mul(other.d).cmp(&other.n.full_mul(self.d))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.n, self.d)
    }
}
