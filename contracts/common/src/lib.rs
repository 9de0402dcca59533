//! ftoken Common Library
//!
//! Building blocks of a single fungible token: the balance ledger, the
//! allowance table, role-based access control and the pause switch, plus
//! the events they emit and the snapshot format that persists them.
//!
//! ## Components
//!
//! - **Ledger** (`token_ops`): balances, total supply, mint/burn/transfer
//! - **AllowanceTable** (`allowance`): delegated spending limits
//! - **AccessRegistry** (`access_control`): role membership and guards
//! - **PauseSwitch** (`emergency`): the freeze for balance-affecting calls
//! - **Capabilities** (`capabilities`): static interface discovery table
//! - **Storage** (`storage`): checksummed snapshots on disk
//!
//! Every mutating primitive validates all of its inputs before the first
//! write and only then emits its events, so a failed call never leaves a
//! partial change or a stray notification.

pub mod constants;
pub mod errors;
pub mod types;
pub mod events;
pub mod token_ops;
pub mod allowance;
pub mod access_control;
pub mod emergency;
pub mod capabilities;
pub mod storage;


// Re-exports for convenience
pub use constants::NULL_ADDRESS;
pub use errors::*;
pub use types::*;
pub use events::*;
pub use token_ops::Ledger;
pub use allowance::AllowanceTable;
pub use access_control::AccessRegistry;
pub use emergency::PauseSwitch;
pub use capabilities::{Capability, InterfaceId};
pub use storage::{Snapshot, SnapshotStore, StorageError};
