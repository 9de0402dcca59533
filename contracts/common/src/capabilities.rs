//! Capability Introspection
//!
//! Static table of the standard interfaces this token implements, queried
//! by tag or by 4-byte interface id. The table is fixed at build time.

use core::fmt;

use serde::{Deserialize, Serialize};

/// 4-byte interface identifier
pub type InterfaceId = [u8; 4];

/// Capability tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Interface discovery itself
    Introspection,
    /// Balances, transfers and allowances
    BasicLedger,
    /// Name, symbol and decimals
    Metadata,
    /// Holders may burn their own balance or an approved one
    Burnable,
    /// Transfers can be frozen by the admin
    Pausable,
    /// Role-based access control
    AccessControl,
}

/// Every capability the token supports, with its interface id
///
/// Introspection, BasicLedger, Metadata and AccessControl use their
/// registered interface ids. Burnable and Pausable have none; their ids are
/// local conventions of this token (the selectors of `burn(uint256)` and
/// `paused()`), answered by `supports_interface` but not recognized by
/// other implementations.
pub const SUPPORTED: [(Capability, InterfaceId); 6] = [
    (Capability::Introspection, [0x01, 0xff, 0xc9, 0xa7]),
    (Capability::BasicLedger, [0x36, 0x37, 0x2b, 0x07]),
    (Capability::Metadata, [0xa2, 0x19, 0xa0, 0x25]),
    (Capability::Burnable, [0x42, 0x96, 0x6c, 0x68]),
    (Capability::Pausable, [0x5c, 0x97, 0x5a, 0xbb]),
    (Capability::AccessControl, [0x79, 0x65, 0xdb, 0x0b]),
];

/// Never a valid interface id
pub const INVALID_INTERFACE: InterfaceId = [0xff; 4];

impl Capability {
    /// Interface id of this capability
    pub fn interface_id(self) -> InterfaceId {
        SUPPORTED
            .iter()
            .find(|(cap, _)| *cap == self)
            .map(|(_, id)| *id)
            .unwrap_or(INVALID_INTERFACE)
    }

    /// Look up a capability by interface id
    pub fn from_interface_id(id: InterfaceId) -> Option<Self> {
        SUPPORTED
            .iter()
            .find(|(_, known)| *known == id)
            .map(|(cap, _)| *cap)
    }

    /// Short tag used on the command line
    pub fn tag(self) -> &'static str {
        match self {
            Capability::Introspection => "introspection",
            Capability::BasicLedger => "basic-ledger",
            Capability::Metadata => "metadata",
            Capability::Burnable => "burnable",
            Capability::Pausable => "pausable",
            Capability::AccessControl => "access-control",
        }
    }

    /// Parse a tag produced by [`Capability::tag`]
    pub fn from_tag(tag: &str) -> Option<Self> {
        SUPPORTED
            .iter()
            .map(|(cap, _)| *cap)
            .find(|cap| cap.tag() == tag)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returns true if the token supports `capability`
pub fn supports_capability(capability: Capability) -> bool {
    SUPPORTED.iter().any(|(cap, _)| *cap == capability)
}

/// Returns true if the token implements the interface `id`
pub fn supports_interface(id: InterfaceId) -> bool {
    id != INVALID_INTERFACE && Capability::from_interface_id(id).is_some()
}
