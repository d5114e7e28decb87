//! Alarm state and limit supervision.
//!
//! [`AlarmTracker`] holds the single active [`AlarmCode`] and the bounded
//! [`EventHistory`] of transitions.  Raising the code that is already active
//! is a no-op; any other code is recorded, becomes active, and fires the
//! visual indicator.  There is no separate clear: clearing is a raise of
//! [`AlarmCode::NoAlarm`].
//!
//! [`LimitMonitor`] is the condition evaluator run by the periodic safety
//! loop.  It compares a set of [`Readings`] against [`SafetyLimits`] and
//! returns the code to raise.

use core::fmt;

use log::{error, info};
use crate::app::ports::AlarmIndicator;
use crate::config::SafetyLimits;
use crate::control::derivation::LiveValues;
use crate::events::EventHistory;

/// Discrete unsafe conditions.  Discriminants are stable for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum AlarmCode {
    #[default]
    NoAlarm = 0,
    HighPressure = 1,
    LowPressure = 2,
    HighVentilation = 3,
    LowVentilation = 4,
    HighVolume = 5,
    LowVolume = 6,
}

impl AlarmCode {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::NoAlarm),
            1 => Some(Self::HighPressure),
            2 => Some(Self::LowPressure),
            3 => Some(Self::HighVentilation),
            4 => Some(Self::LowVentilation),
            5 => Some(Self::HighVolume),
            6 => Some(Self::LowVolume),
            _ => None,
        }
    }

    pub const fn is_alarm(self) -> bool {
        !matches!(self, Self::NoAlarm)
    }
}

impl fmt::Display for AlarmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAlarm => write!(f, "no alarm"),
            Self::HighPressure => write!(f, "high pressure"),
            Self::LowPressure => write!(f, "low pressure"),
            Self::HighVentilation => write!(f, "high minute ventilation"),
            Self::LowVentilation => write!(f, "low minute ventilation"),
            Self::HighVolume => write!(f, "high tidal volume"),
            Self::LowVolume => write!(f, "low tidal volume"),
        }
    }
}

// ---------------------------------------------------------------------------
// Alarm tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AlarmTracker {
    current: AlarmCode,
    history: EventHistory,
}

impl AlarmTracker {
    pub const fn new() -> Self {
        Self {
            current: AlarmCode::NoAlarm,
            history: EventHistory::new(),
        }
    }

    /// Make `code` the active alarm.
    ///
    /// Returns `false` (and touches nothing) when `code` is already active.
    pub fn raise(&mut self, code: AlarmCode, indicator: &mut impl AlarmIndicator) -> bool {
        if code == self.current {
            return false;
        }

        if code.is_alarm() {
            error!("ALARM RAISED: {code} (was {})", self.current);
        } else {
            info!("ALARM CLEARED: {}", self.current);
        }

        self.history.push(code);
        self.current = code;
        indicator.alarm_changed(code);
        true
    }

    pub fn current(&self) -> AlarmCode {
        self.current
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    /// Back to `NoAlarm` with an empty history.  Only used on explicit
    /// reinitialisation, never by a factory reset.
    pub fn reset(&mut self) {
        self.current = AlarmCode::NoAlarm;
        self.history.clear();
    }
}

// ---------------------------------------------------------------------------
// Limit monitor
// ---------------------------------------------------------------------------

/// Quantities checked against [`SafetyLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readings {
    pub pressure: u32,
    pub ventilation: u32,
    pub volume: u32,
}

impl Readings {
    /// Readings taken from the display mirrors and minute ventilation.
    pub fn from_live(live: &LiveValues) -> Self {
        Self {
            pressure: u32::from(live.pressure),
            ventilation: live.minute_ventilation,
            volume: u32::from(live.volume),
        }
    }
}

pub struct LimitMonitor;

impl LimitMonitor {
    /// First violated bound, checked pressure → ventilation → volume, high
    /// before low.  `NoAlarm` when everything is within bounds.
    pub fn evaluate(readings: &Readings, limits: &SafetyLimits) -> AlarmCode {
        // ── Pressure ──────────────────────────────────────────────
        if limits.pressure.is_above(readings.pressure) {
            return AlarmCode::HighPressure;
        }
        if limits.pressure.is_below(readings.pressure) {
            return AlarmCode::LowPressure;
        }

        // ── Minute ventilation ────────────────────────────────────
        if limits.ventilation.is_above(readings.ventilation) {
            return AlarmCode::HighVentilation;
        }
        if limits.ventilation.is_below(readings.ventilation) {
            return AlarmCode::LowVentilation;
        }

        // ── Volume ────────────────────────────────────────────────
        if limits.volume.is_above(readings.volume) {
            return AlarmCode::HighVolume;
        }
        if limits.volume.is_below(readings.volume) {
            return AlarmCode::LowVolume;
        }

        AlarmCode::NoAlarm
    }
}
