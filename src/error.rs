//! Unified error types for the ventilator control core.
//!
//! A single `Error` enum that every fallible operation converts into.
//! All variants are `Copy` so they can be handed back through the
//! controller and command dispatch without allocation.
//!
//! The derivation layer itself has no error paths: its formulas are total
//! as long as the documented denominators are non-zero.  Errors only come
//! from the storage boundary and from the checked setter/limit paths.

use core::fmt;

use crate::app::ports::StorageError;
use crate::config::Setting;
use crate::persistence::RecordKind;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The record store rejected a read or write.
    Storage(StorageError),
    /// A stored record could not be decoded or holds unusable values.
    Corrupted(RecordKind),
    /// A checked setter was given a value outside the setting's input range.
    OutOfRange(Setting),
    /// A safety limit pair is malformed (minimum above maximum).
    InvalidLimits(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Corrupted(kind) => write!(f, "corrupted {kind} record"),
            Self::OutOfRange(setting) => write!(f, "{setting} out of range"),
            Self::InvalidLimits(msg) => write!(f, "invalid limits: {msg}"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
