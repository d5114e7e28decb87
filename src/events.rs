//! Bounded alarm history.
//!
//! Index-based circular buffer of the most recent alarm transitions.
//! Inserting overwrites the oldest slot in place; reads come back newest
//! first, the order the events page shows them in.
//!
//! ```text
//!   slots:  [ c3 | c4 | c0 | c1 | c2 ]      head = 2 (next write)
//!   read:     c4, c3, c2, c1, c0            (index 0 = newest)
//! ```

use crate::safety::AlarmCode;

/// Number of transitions kept for display.
pub const MAX_EVENTS: usize = 5;

#[derive(Debug, Clone)]
pub struct EventHistory {
    slots: [AlarmCode; MAX_EVENTS],
    /// Slot the next insert writes to.
    head: usize,
    /// Entries held, saturating at `MAX_EVENTS`.
    len: usize,
    /// Every transition since the history was cleared (saturating).
    total: u32,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHistory {
    pub const fn new() -> Self {
        Self {
            slots: [AlarmCode::NoAlarm; MAX_EVENTS],
            head: 0,
            len: 0,
            total: 0,
        }
    }

    /// Record `code` as the newest entry, dropping the oldest once full.
    pub fn push(&mut self, code: AlarmCode) {
        self.slots[self.head] = code;
        self.head = (self.head + 1) % MAX_EVENTS;
        self.len = (self.len + 1).min(MAX_EVENTS);
        self.total = self.total.saturating_add(1);
    }

    /// Entry `index` positions back from the newest (0 = newest).
    pub fn get(&self, index: usize) -> Option<AlarmCode> {
        if index >= self.len {
            return None;
        }
        let slot = (self.head + MAX_EVENTS - 1 - index) % MAX_EVENTS;
        Some(self.slots[slot])
    }

    /// Newest-first iterator over the held entries.
    pub fn iter(&self) -> impl Iterator<Item = AlarmCode> + '_ {
        (0..self.len).filter_map(|i| self.get(i))
    }

    /// Newest-first copy of the held entries.
    pub fn newest_first(&self) -> heapless::Vec<AlarmCode, MAX_EVENTS> {
        self.iter().collect()
    }

    /// Displayed alarm count, capped at [`MAX_EVENTS`].
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Transitions recorded since the last clear, not capped by capacity.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
