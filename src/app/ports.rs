//! Port traits — the boundary between the control core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerState (domain)
//! ```
//!
//! Driven adapters (record storage, alarm indicator, event sinks) implement
//! these traits.  [`ControllerState`](super::service::ControllerState) takes
//! them as generic parameters at each call site, so the core never touches
//! hardware directly.

use crate::safety::AlarmCode;

// ───────────────────────────────────────────────────────────────
// Record store (driven adapter: domain ↔ EEPROM / NVS)
// ───────────────────────────────────────────────────────────────

/// Byte-addressed durable storage holding the fixed-size settings and
/// limits records.
///
/// # Contract
///
/// - `store` MUST be durable once it returns `Ok` and atomic per call: a
///   power loss leaves either the old or the new bytes, never a mix.
/// - Repeating a `store` with the same bytes is harmless.
/// - `load` fills the whole of `buf`; there is no "missing" record, a blank
///   device simply returns whatever the erased cells hold.
pub trait RecordStore {
    /// Copy `buf.len()` bytes starting at `offset` into `buf`.
    fn load(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` starting at `offset`.
    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Alarm indicator (driven adapter: domain → LED / buzzer)
// ───────────────────────────────────────────────────────────────

/// Visual alarm indicator.  Called once for every change of the active
/// alarm code, never for a repeated raise.
pub trait AlarmIndicator {
    fn alarm_changed(&mut self, code: AlarmCode);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, display
/// refresh, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`RecordStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The requested range lies outside the device.
    OutOfBounds,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
