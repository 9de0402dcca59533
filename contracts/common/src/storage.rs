//! Snapshot Storage
//!
//! Durable form of the complete token state. A snapshot file is
//!
//! ```text
//! MAGIC (4) | VERSION (1) | SHA-256(payload) (32) | borsh payload
//! ```
//!
//! Saves go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use borsh::{BorshDeserialize, BorshSerialize};
use log::{debug, info};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::access_control::AccessRegistry;
use crate::allowance::AllowanceTable;
use crate::constants::storage::{HEADER_LEN, MAGIC, VERSION};
use crate::emergency::PauseSwitch;
use crate::token_ops::Ledger;

/// Errors raised while reading or writing snapshots
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a token snapshot (bad magic)")]
    BadMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),

    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("snapshot decode failed: {0}")]
    Decode(io::Error),

    #[error("snapshot is inconsistent: {0}")]
    Corrupt(&'static str),
}

/// Complete persisted token state
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Snapshot {
    pub name: String,
    pub symbol: String,
    pub ledger: Ledger,
    pub allowances: AllowanceTable,
    pub access: AccessRegistry,
    pub pause: PauseSwitch,
}

impl Snapshot {
    /// Frame the snapshot with magic, version and checksum
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        let payload = borsh::to_vec(self)?;
        let digest = Sha256::digest(&payload);

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&digest);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Verify the framing and decode
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < HEADER_LEN || bytes[..4] != MAGIC {
            return Err(StorageError::BadMagic);
        }
        if bytes[4] != VERSION {
            return Err(StorageError::UnsupportedVersion(bytes[4]));
        }

        let (header, payload) = bytes.split_at(HEADER_LEN);
        if Sha256::digest(payload).as_slice() != &header[5..HEADER_LEN] {
            return Err(StorageError::ChecksumMismatch);
        }

        let snapshot: Snapshot = borsh::from_slice(payload).map_err(StorageError::Decode)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Structural checks a well-formed snapshot always passes
    pub fn validate(&self) -> Result<(), StorageError> {
        if !self.ledger.is_conserved() {
            return Err(StorageError::Corrupt("balances do not sum to total supply"));
        }
        Ok(())
    }
}

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a snapshot has been saved
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Atomically replace the stored snapshot
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let bytes = snapshot.encode()?;
        let tmp = self.path.with_extension("tmp");

        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        info!("saved snapshot to {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }

    /// Load and verify the stored snapshot
    pub fn load(&self) -> Result<Snapshot, StorageError> {
        let bytes = fs::read(&self.path)?;
        debug!("read {} bytes from {}", bytes.len(), self.path.display());
        Snapshot::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::pause;
    use crate::events::EventLog;
    use crate::token_ops::execute_mint;

    fn sample() -> Snapshot {
        let admin = [1u8; 32];
        let mut ledger = Ledger::new();
        let mut pause_switch = PauseSwitch::new();
        let mut events = EventLog::new();
        execute_mint(&mut ledger, &pause_switch, admin, 5_000, &mut events).unwrap();
        pause(&mut pause_switch, admin, &mut events).unwrap();

        Snapshot {
            name: "Test".into(),
            symbol: "TST".into(),
            ledger,
            allowances: AllowanceTable::new(),
            access: AccessRegistry::new(admin),
            pause: pause_switch,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.ftk"));
        assert!(!store.exists());

        let snapshot = sample();
        store.save(&snapshot).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let mut bytes = sample().encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(Snapshot::decode(&bytes), Err(StorageError::ChecksumMismatch)));
    }

    #[test]
    fn test_bad_header_rejected() {
        assert!(matches!(Snapshot::decode(b"nope"), Err(StorageError::BadMagic)));

        let mut bytes = sample().encode().unwrap();
        bytes[4] = VERSION + 1;
        assert!(matches!(
            Snapshot::decode(&bytes),
            Err(StorageError::UnsupportedVersion(v)) if v == VERSION + 1
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("absent.ftk"));
        assert!(matches!(store.load(), Err(StorageError::Io(_))));
    }
}
