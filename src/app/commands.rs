//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (front-panel
//! input, serial console, safety loop) that
//! [`ControllerState`](super::service::ControllerState) interprets and acts
//! upon.

use crate::config::{SafetyLimits, Setting};
use crate::control::clamp::Direction;
use crate::safety::AlarmCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Store an already-clamped value.
    Set(Setting, u16),

    /// Move a setting one input step, clamped to its range.
    Step(Setting, Direction),

    /// Start or stop ventilation.
    SetVentilationActive(bool),

    /// Replace the alarm bounds.
    SetLimits(SafetyLimits),

    /// Install factory settings and limits.
    FactoryReset,

    /// Report a condition detected by the safety loop.
    RaiseAlarm(AlarmCode),
}
