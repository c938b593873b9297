//! Capability tokens gating privileged configuration.
//!
//! The host mints one [`AdminCapability`] per deployment and hands the
//! matching [`CapabilityKey`] to every component it constructs. Setters take
//! `&AdminCapability`; a capability minted for another deployment is
//! rejected with [`LiquidityError::Unauthorized`].

use crate::error::{LiquidityError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Proof of the privileged role. Deliberately neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
pub struct AdminCapability {
    key: CapabilityKey,
}

impl AdminCapability {
    /// Mints a capability for the deployment identified by `secret`.
    pub fn mint(secret: u64) -> Self {
        Self {
            key: CapabilityKey(secret),
        }
    }

    /// Public key components use to recognise this capability.
    pub fn key(&self) -> CapabilityKey {
        self.key
    }
}

/// Identifier stored by components to check a presented capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityKey(u64);

impl CapabilityKey {
    /// Verifies that `capability` was minted for this key.
    pub fn authorize(&self, capability: &AdminCapability) -> Result<()> {
        if capability.key != *self {
            warn!("Rejected privileged call with a foreign capability");
            return Err(LiquidityError::Unauthorized);
        }
        Ok(())
    }
}
