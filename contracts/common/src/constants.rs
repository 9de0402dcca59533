//! Token Constants
//!
//! Fixed parameters of the ftoken ledger. Display metadata (name, symbol)
//! is chosen at construction; everything here is constant per build.

use crate::types::{Address, Amount};

/// Token Metadata
pub mod token {
    use super::Amount;

    /// Default token name
    pub const DEFAULT_NAME: &str = "Fungible Token";
    /// Default token symbol
    pub const DEFAULT_SYMBOL: &str = "FTK";
    /// Decimal places
    pub const DECIMALS: u8 = 18;
    /// One whole token in base units (10^18)
    pub const ONE: Amount = 1_000_000_000_000_000_000;
    /// Supply minted to the deploying principal at construction
    pub const INITIAL_SUPPLY: Amount = 1_000_000 * ONE;
}

/// Allowance parameters
pub mod allowance {
    use super::Amount;

    /// Value treated as "never decrement" when the unlimited sentinel is enabled
    pub const UNLIMITED: Amount = Amount::MAX;
}

/// The null account: counterpart of every mint and burn
pub const NULL_ADDRESS: Address = [0u8; 32];

/// Snapshot framing
pub mod storage {
    /// File magic
    pub const MAGIC: [u8; 4] = *b"FTKS";
    /// Current snapshot format version
    pub const VERSION: u8 = 1;
    /// Length of the header preceding the payload (magic + version + sha256)
    pub const HEADER_LEN: usize = 4 + 1 + 32;
}
