//! Outbound controller events.
//!
//! [`ControllerState`](super::service::ControllerState) emits these through
//! the [`EventSink`](super::ports::EventSink) port while dispatching
//! commands.  Adapters decide what to do with them: log to serial, refresh
//! the display, etc.

use crate::config::{SafetyLimits, Setting};
use crate::control::derivation::LiveValues;
use crate::safety::AlarmCode;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A setting was stored; carries the refreshed live values.
    SettingChanged {
        setting: Setting,
        value: u16,
        live: LiveValues,
    },

    /// Ventilation was started or stopped.
    VentilationChanged(bool),

    /// New alarm bounds were stored.
    LimitsChanged(SafetyLimits),

    /// Factory settings and limits were installed.
    FactoryReset,

    /// The active alarm code changed.
    AlarmChanged { from: AlarmCode, to: AlarmCode },
}
