//! Fixed-size record layout for the settings store.
//!
//! ```text
//! offset 0                      SETTINGS_RECORD_SIZE            + LIMITS_RECORD_SIZE
//! ┌─────────────────────────────┬───────────────────────────────┐
//! │ ControlSettings (postcard,  │ SafetyLimits (postcard,       │
//! │ zero padded)                │ zero padded)                  │
//! └─────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! Records carry no version or checksum.  Whatever decodes is trusted;
//! callers that want range checks validate after loading.

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::RecordStore;
use crate::config::{ControlSettings, SafetyLimits};
use crate::error::{Error, Result};

/// Bytes reserved for the settings record.
pub const SETTINGS_RECORD_SIZE: usize = 32;

/// Bytes reserved for the limits record.
pub const LIMITS_RECORD_SIZE: usize = 24;

pub const SETTINGS_OFFSET: usize = 0;
pub const LIMITS_OFFSET: usize = SETTINGS_RECORD_SIZE;

/// Total bytes the two records occupy.
pub const STORAGE_SIZE: usize = LIMITS_OFFSET + LIMITS_RECORD_SIZE;

const MAX_RECORD_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Settings,
    Limits,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings => write!(f, "settings"),
            Self::Limits => write!(f, "limits"),
        }
    }
}

/// A persisted record with a fixed slot in the store.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;
    const OFFSET: usize;
    const SIZE: usize;
}

impl Record for ControlSettings {
    const KIND: RecordKind = RecordKind::Settings;
    const OFFSET: usize = SETTINGS_OFFSET;
    const SIZE: usize = SETTINGS_RECORD_SIZE;
}

impl Record for SafetyLimits {
    const KIND: RecordKind = RecordKind::Limits;
    const OFFSET: usize = LIMITS_OFFSET;
    const SIZE: usize = LIMITS_RECORD_SIZE;
}

/// Encode `record` into its zero-padded slot image.
pub fn encode<R: Record>(record: &R) -> Result<heapless::Vec<u8, MAX_RECORD_SIZE>> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    postcard::to_slice(record, &mut buf[..R::SIZE]).map_err(|_| Error::Corrupted(R::KIND))?;
    heapless::Vec::from_slice(&buf[..R::SIZE]).map_err(|()| Error::Corrupted(R::KIND))
}

/// Decode a record from its slot image.  Trailing padding is ignored.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R> {
    postcard::from_bytes(bytes).map_err(|_| Error::Corrupted(R::KIND))
}

/// Read and decode the record from its slot.
pub fn load_record<R: Record>(store: &impl RecordStore) -> Result<R> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    store.load(R::OFFSET, &mut buf[..R::SIZE])?;
    decode(&buf[..R::SIZE])
}

/// Encode the record and write its whole slot.
pub fn store_record<R: Record>(store: &mut impl RecordStore, record: &R) -> Result<()> {
    let image = encode(record)?;
    store.store(R::OFFSET, &image)?;
    Ok(())
}
