use crate::error::LiquidityError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account identifier (liquidity provider, collaborator, token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address, never a valid collaborator or token.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Builds an address whose last eight bytes hold `value`. Handy for tests and fixtures.
    pub const fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        let be = value.to_be_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = LiquidityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|_| LiquidityError::InvalidAddress("malformed hex"))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| LiquidityError::InvalidAddress("address must be 20 bytes"))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Fungible asset identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Token(pub Address);

impl Token {
    /// The zero token, rejected wherever a token is expected.
    pub const ZERO: Token = Token(Address::ZERO);

    /// The chain's base currency. Pools for it behave like any other pool;
    /// wrapping is handled by the custody layer.
    pub const NATIVE: Token = Token(Address([0xee; 20]));

    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    pub const fn from_low_u64(value: u64) -> Self {
        Self(Address::from_low_u64(value))
    }

    pub fn address(&self) -> Address {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    /// Rejects the zero token with [`LiquidityError::InvalidAddress`].
    pub fn validate(&self, what: &'static str) -> Result<(), LiquidityError> {
        if self.is_zero() {
            return Err(LiquidityError::InvalidAddress(what));
        }
        Ok(())
    }

    /// Derives the liquidity-share token id for the pool of this token
    /// (bitwise complement of the reserve token address).
    pub fn derive_pool_token(&self) -> Token {
        let mut bytes = self.0.0;
        for b in bytes.iter_mut() {
            *b = !*b;
        }
        Token(Address(bytes))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Token {
    type Err = LiquidityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_str(s).map(Token)
    }
}

impl From<Address> for Token {
    fn from(address: Address) -> Self {
        Self(address)
    }
}
