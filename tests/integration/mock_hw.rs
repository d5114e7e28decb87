//! Mock port adapters for integration tests.
//!
//! Records every storage write, indicator call and emitted event so tests
//! can assert on the full history without touching real flash or GPIO.

use bvm_ventilator::app::events::AppEvent;
use bvm_ventilator::app::ports::{AlarmIndicator, EventSink, RecordStore, StorageError};
use bvm_ventilator::persistence::STORAGE_SIZE;
use bvm_ventilator::safety::AlarmCode;

// ── MockStore ─────────────────────────────────────────────────

pub struct MockStore {
    pub image: Vec<u8>,
    /// `(offset, len)` of every successful write.
    pub writes: Vec<(usize, usize)>,
    /// When set, every `store` call fails with `IoError`.
    pub fail_writes: bool,
    /// When set, `store` fails once this many writes have succeeded.
    pub fail_after: Option<usize>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self {
            image: vec![0xFF; STORAGE_SIZE],
            writes: Vec::new(),
            fail_writes: false,
            fail_after: None,
        }
    }

    pub fn zeroed() -> Self {
        Self {
            image: vec![0; STORAGE_SIZE],
            ..Self::new()
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MockStore {
    fn load(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let end = offset + buf.len();
        if end > self.image.len() {
            return Err(StorageError::OutOfBounds);
        }
        buf.copy_from_slice(&self.image[offset..end]);
        Ok(())
    }

    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes || self.fail_after.is_some_and(|n| self.writes.len() >= n) {
            return Err(StorageError::IoError);
        }
        let end = offset + data.len();
        if end > self.image.len() {
            return Err(StorageError::OutOfBounds);
        }
        self.image[offset..end].copy_from_slice(data);
        self.writes.push((offset, data.len()));
        Ok(())
    }
}

// ── MockIndicator ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockIndicator {
    pub calls: Vec<AlarmCode>,
}

impl AlarmIndicator for MockIndicator {
    fn alarm_changed(&mut self, code: AlarmCode) {
        self.calls.push(code);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
