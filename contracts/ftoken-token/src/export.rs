//! Event Export
//!
//! Committed events appended to a file as a CBOR sequence: one
//! self-delimiting CBOR item per event, no outer framing. Appending never
//! rewrites earlier records.

use std::fs::{self, OpenOptions};
use std::io::{Cursor, Write};
use std::path::Path;

use ftoken_common::TokenEvent;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while exporting or reading events
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("event file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode event: {0}")]
    Encode(String),

    #[error("failed to decode event at byte {offset}: {reason}")]
    Decode { offset: u64, reason: String },
}

/// One exported event with its position in the export stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: TokenEvent,
}

/// Encode records as a CBOR sequence
pub fn encode_records(records: &[EventRecord]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    for record in records {
        ciborium::into_writer(record, &mut buf).map_err(|e| ExportError::Encode(e.to_string()))?;
    }
    Ok(buf)
}

/// Decode every record in a CBOR sequence
pub fn decode_records(bytes: &[u8]) -> Result<Vec<EventRecord>, ExportError> {
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::new();

    while (cursor.position() as usize) < bytes.len() {
        let offset = cursor.position();
        let record = ciborium::from_reader(&mut cursor).map_err(|e| ExportError::Decode {
            offset,
            reason: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Read all records from an export file; a missing file reads as empty
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<EventRecord>, ExportError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    decode_records(&fs::read(path)?)
}

/// Append events to an export file, numbering them after the last record
///
/// Returns the number of records written.
pub fn append_events(path: impl AsRef<Path>, events: &[TokenEvent]) -> Result<usize, ExportError> {
    let path = path.as_ref();
    if events.is_empty() {
        return Ok(0);
    }

    let next = read_events(path)?
        .last()
        .map(|record| record.sequence + 1)
        .unwrap_or(0);

    let records: Vec<EventRecord> = events
        .iter()
        .cloned()
        .zip(next..)
        .map(|(event, sequence)| EventRecord { sequence, event })
        .collect();
    let bytes = encode_records(&records)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;

    debug!("exported {} events to {}", records.len(), path.display());
    Ok(records.len())
}
