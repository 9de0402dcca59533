//! Access Control Module
//!
//! Role-based access control for the token. Every role maps to the set of
//! principals holding it; membership is boolean.
//!
//! ## Key Features
//!
//! - **Admin Role**: seeded with the deploying principal, gates mint/pause
//! - **Role Admins**: granting or revoking a role requires its admin role
//! - **Renounce**: a holder may drop its own role, never someone else's
//! - **Pure Guards**: [`require_role`] checks without touching state

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, TokenEvent};
use crate::types::{Address, RoleId};
use crate::{TokenError, TokenResult};

// ============================================================================
// Types
// ============================================================================

/// Role registry: role id -> holders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessRegistry {
    members: BTreeMap<RoleId, BTreeSet<Address>>,
}

impl AccessRegistry {
    /// Create a registry whose admin role is held by exactly `admin`
    pub fn new(admin: Address) -> Self {
        let mut registry = Self::default();
        registry.grant(RoleId::ADMIN, admin);
        registry
    }

    /// Check if `account` holds `role`
    pub fn has_role(&self, role: RoleId, account: &Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|holders| holders.contains(account))
    }

    /// Admin role of `role`; every role is administered by [`RoleId::ADMIN`]
    pub fn role_admin(&self, _role: RoleId) -> RoleId {
        RoleId::ADMIN
    }

    /// Add `account` to `role`. Returns false if it already held the role.
    pub fn grant(&mut self, role: RoleId, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Remove `account` from `role`. Returns false if it did not hold the role.
    pub fn revoke(&mut self, role: RoleId, account: Address) -> bool {
        let Some(holders) = self.members.get_mut(&role) else {
            return false;
        };
        let removed = holders.remove(&account);
        if holders.is_empty() {
            self.members.remove(&role);
        }
        removed
    }

    /// Holders of `role`
    pub fn members(&self, role: RoleId) -> impl Iterator<Item = &Address> {
        self.members.get(&role).into_iter().flatten()
    }

    /// Roles currently held by `account`
    pub fn roles_of(&self, account: &Address) -> Vec<RoleId> {
        self.members
            .iter()
            .filter(|(_, holders)| holders.contains(account))
            .map(|(role, _)| *role)
            .collect()
    }
}

// ============================================================================
// Guarded Functions
// ============================================================================

/// Fail with `Unauthorized` unless `caller` holds `role`
pub fn require_role(registry: &AccessRegistry, role: RoleId, caller: &Address) -> TokenResult<()> {
    if registry.has_role(role, caller) {
        return Ok(());
    }

    warn!("rejected call from 0x{}: missing role {}", hex::encode(caller), role);
    Err(TokenError::Unauthorized {
        account: *caller,
        role,
    })
}

/// Grant `role` to `account`, on behalf of `sender`
///
/// `sender` must hold the role's admin role. Granting a role that is
/// already held changes nothing and emits nothing.
pub fn grant_role(
    registry: &mut AccessRegistry,
    sender: Address,
    role: RoleId,
    account: Address,
    events: &mut EventLog,
) -> TokenResult<bool> {
    // 1. Sender must administer the role
    require_role(registry, registry.role_admin(role), &sender)?;

    // 2. Apply, emit only on change
    let granted = registry.grant(role, account);
    if granted {
        info!("role {} granted to 0x{}", role, hex::encode(account));
        events.emit(TokenEvent::RoleGranted { role, account, sender });
    }

    Ok(granted)
}

/// Revoke `role` from `account`, on behalf of `sender`
pub fn revoke_role(
    registry: &mut AccessRegistry,
    sender: Address,
    role: RoleId,
    account: Address,
    events: &mut EventLog,
) -> TokenResult<bool> {
    // 1. Sender must administer the role
    require_role(registry, registry.role_admin(role), &sender)?;

    // 2. Apply, emit only on change
    let revoked = registry.revoke(role, account);
    if revoked {
        info!("role {} revoked from 0x{}", role, hex::encode(account));
        events.emit(TokenEvent::RoleRevoked { role, account, sender });
    }

    Ok(revoked)
}

/// Drop `role` from `caller` itself
///
/// `confirmation` must repeat the caller's own address.
pub fn renounce_role(
    registry: &mut AccessRegistry,
    caller: Address,
    role: RoleId,
    confirmation: Address,
    events: &mut EventLog,
) -> TokenResult<bool> {
    if confirmation != caller {
        return Err(TokenError::BadConfirmation);
    }

    let revoked = registry.revoke(role, caller);
    if revoked {
        info!("role {} renounced by 0x{}", role, hex::encode(caller));
        events.emit(TokenEvent::RoleRevoked {
            role,
            account: caller,
            sender: caller,
        });
    }

    Ok(revoked)
}

// ============================================================================
// Tests
// ============================================================================
