//! Core Types for the ftoken ledger
//!
//! Identifiers and small value types shared by every component.

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::NULL_ADDRESS;

/// Type alias for account identifiers (32 opaque bytes)
pub type Address = [u8; 32];

/// Token amount in base units
pub type Amount = u128;

/// Returns true for the null account
pub fn is_null(address: &Address) -> bool {
    *address == NULL_ADDRESS
}

// ============ Roles ============

/// Role identifier
///
/// The administrative role is all zero bytes. Every other role is the
/// SHA-256 digest of its name, so ids are stable across builds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct RoleId(pub [u8; 32]);

impl RoleId {
    /// Administrative role: mints, pauses, and administers every other role
    pub const ADMIN: RoleId = RoleId([0u8; 32]);

    /// Derive a role id from its human-readable name
    pub fn named(name: &str) -> Self {
        RoleId(Sha256::digest(name.as_bytes()).into())
    }

    /// Returns true if this is the administrative role
    pub fn is_admin(&self) -> bool {
        *self == Self::ADMIN
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_admin() {
            f.write_str("ADMIN")
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

// ============ Pause State ============

/// State of the pause switch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum PauseState {
    /// Transfers, mints and burns are allowed
    #[default]
    Active,
    /// Every balance-affecting operation is rejected
    Paused,
}

impl PauseState {
    /// Returns true while paused
    pub fn is_paused(&self) -> bool {
        *self == PauseState::Paused
    }
}
