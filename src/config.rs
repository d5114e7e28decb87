//! Therapy settings, safety limits and mechanical constants.
//!
//! [`ControlSettings`] and [`SafetyLimits`] are the two persisted records.
//! Their `Default` impls are the factory values installed by a factory reset.
//! [`InputRange`] holds the per-setting bounds and step sizes that the input
//! layer clamps against before any setter runs.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Step position of the fully-pressed end stop.
pub const END_POSITION: u32 = 3200;

/// Motor steps for one full revolution (including microstepping).
pub const STEPS_PER_REVOLUTION: u32 = 1600;

// ---------------------------------------------------------------------------
// Mechanical profile
// ---------------------------------------------------------------------------

/// Fixed mechanical constants of the bag press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MechanicalProfile {
    /// Step position where the bag is fully compressed.
    pub end_position: u32,
    /// Steps per motor revolution.
    pub steps_per_revolution: u32,
}

impl Default for MechanicalProfile {
    fn default() -> Self {
        Self {
            end_position: END_POSITION,
            steps_per_revolution: STEPS_PER_REVOLUTION,
        }
    }
}

// ---------------------------------------------------------------------------
// Control settings
// ---------------------------------------------------------------------------

/// Clinician-set control parameters (persisted at offset 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Step offset of the press start position.
    pub start_position: u16,
    /// Air volume (mL) delivered by a full press; calibrated per bag vendor.
    pub full_press_volume: u16,
    /// Air volume (mL) per breath.
    pub tidal_volume: u16,
    /// Breaths per minute.
    pub respiratory_rate: u16,
    /// Expiratory part of the I:E ratio (1:n).
    pub respiratory_ratio: u16,
    /// Maximum inspiratory pressure.
    pub plateau_airway_pressure: u16,
    /// Peak inspiratory flow.
    pub inspiratory_flow: u16,
    /// Peak expiratory flow.
    pub expiratory_flow: u16,
    /// Inspiratory breath pressure trigger.
    pub trigger_pressure: u16,
    pub ventilation_active: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            start_position: 500,
            full_press_volume: 850,
            tidal_volume: 450,
            respiratory_rate: 12,
            respiratory_ratio: 3,
            plateau_airway_pressure: 300,
            inspiratory_flow: 35,
            expiratory_flow: 35,
            trigger_pressure: 50,
            ventilation_active: false,
        }
    }
}

impl ControlSettings {
    /// Read the numeric value of one setting.
    pub fn get(&self, setting: Setting) -> u16 {
        match setting {
            Setting::StartPosition => self.start_position,
            Setting::FullPressVolume => self.full_press_volume,
            Setting::TidalVolume => self.tidal_volume,
            Setting::RespiratoryRate => self.respiratory_rate,
            Setting::RespiratoryRatio => self.respiratory_ratio,
            Setting::PlateauAirwayPressure => self.plateau_airway_pressure,
            Setting::InspiratoryFlow => self.inspiratory_flow,
            Setting::ExpiratoryFlow => self.expiratory_flow,
            Setting::TriggerPressure => self.trigger_pressure,
        }
    }

    /// Overwrite the numeric value of one setting.  No derivation happens here.
    pub fn put(&mut self, setting: Setting, value: u16) {
        let field = match setting {
            Setting::StartPosition => &mut self.start_position,
            Setting::FullPressVolume => &mut self.full_press_volume,
            Setting::TidalVolume => &mut self.tidal_volume,
            Setting::RespiratoryRate => &mut self.respiratory_rate,
            Setting::RespiratoryRatio => &mut self.respiratory_ratio,
            Setting::PlateauAirwayPressure => &mut self.plateau_airway_pressure,
            Setting::InspiratoryFlow => &mut self.inspiratory_flow,
            Setting::ExpiratoryFlow => &mut self.expiratory_flow,
            Setting::TriggerPressure => &mut self.trigger_pressure,
        };
        *field = value;
    }

    /// Check every setting against its [`InputRange`].
    ///
    /// Used on records read back from storage, which bypass the input clamp.
    pub fn validate(&self) -> Result<()> {
        for setting in Setting::ALL {
            if !setting.range().contains(self.get(setting)) {
                return Err(Error::OutOfRange(setting));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Setting identifiers and input ranges
// ---------------------------------------------------------------------------

/// Numeric control parameters that have a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    StartPosition,
    FullPressVolume,
    TidalVolume,
    RespiratoryRate,
    RespiratoryRatio,
    PlateauAirwayPressure,
    InspiratoryFlow,
    ExpiratoryFlow,
    TriggerPressure,
}

impl Setting {
    pub const ALL: [Setting; 9] = [
        Setting::StartPosition,
        Setting::FullPressVolume,
        Setting::TidalVolume,
        Setting::RespiratoryRate,
        Setting::RespiratoryRatio,
        Setting::PlateauAirwayPressure,
        Setting::InspiratoryFlow,
        Setting::ExpiratoryFlow,
        Setting::TriggerPressure,
    ];

    /// Bounds and step size the input layer clamps this setting to.
    ///
    /// Every range keeps the derivation denominators non-zero:
    /// `respiratory_rate >= 6`, `full_press_volume >= 300` and
    /// `start_position <= END_POSITION - 400`.
    pub const fn range(self) -> InputRange {
        match self {
            Setting::StartPosition => InputRange::new(0, 2800, 10),
            Setting::FullPressVolume => InputRange::new(300, 1500, 10),
            Setting::TidalVolume => InputRange::new(100, 1000, 10),
            Setting::RespiratoryRate => InputRange::new(6, 40, 1),
            Setting::RespiratoryRatio => InputRange::new(1, 4, 1),
            Setting::PlateauAirwayPressure => InputRange::new(50, 400, 10),
            Setting::InspiratoryFlow => InputRange::new(10, 120, 1),
            Setting::ExpiratoryFlow => InputRange::new(10, 120, 1),
            Setting::TriggerPressure => InputRange::new(0, 100, 5),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Setting::StartPosition => "start position",
            Setting::FullPressVolume => "full press volume",
            Setting::TidalVolume => "tidal volume",
            Setting::RespiratoryRate => "respiratory rate",
            Setting::RespiratoryRatio => "respiratory ratio",
            Setting::PlateauAirwayPressure => "plateau airway pressure",
            Setting::InspiratoryFlow => "inspiratory flow",
            Setting::ExpiratoryFlow => "expiratory flow",
            Setting::TriggerPressure => "trigger pressure",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive `[lo, hi]` bounds plus the increment of one input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRange {
    pub lo: u16,
    pub hi: u16,
    pub step: u16,
}

impl InputRange {
    pub const fn new(lo: u16, hi: u16, step: u16) -> Self {
        Self { lo, hi, step }
    }

    pub const fn contains(&self, value: u16) -> bool {
        value >= self.lo && value <= self.hi
    }
}

// ---------------------------------------------------------------------------
// Safety limits
// ---------------------------------------------------------------------------

/// A `{minimum, maximum}` pair of alarm bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub minimum: u16,
    pub maximum: u16,
}

impl Limit {
    pub const fn new(minimum: u16, maximum: u16) -> Self {
        Self { minimum, maximum }
    }

    pub const fn is_below(&self, value: u32) -> bool {
        value < self.minimum as u32
    }

    pub const fn is_above(&self, value: u32) -> bool {
        value > self.maximum as u32
    }
}

/// Alarm bounds for pressure, minute ventilation and volume (persisted
/// directly after [`ControlSettings`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyLimits {
    pub pressure: Limit,
    pub ventilation: Limit,
    pub volume: Limit,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            pressure: Limit::new(50, 400),
            ventilation: Limit::new(3000, 8000),
            volume: Limit::new(180, 750),
        }
    }
}

impl SafetyLimits {
    /// Every pair must satisfy `minimum <= maximum`.
    pub fn validate(&self) -> Result<()> {
        if self.pressure.minimum > self.pressure.maximum {
            return Err(Error::InvalidLimits("pressure minimum above maximum"));
        }
        if self.ventilation.minimum > self.ventilation.maximum {
            return Err(Error::InvalidLimits("ventilation minimum above maximum"));
        }
        if self.volume.minimum > self.volume.maximum {
            return Err(Error::InvalidLimits("volume minimum above maximum"));
        }
        Ok(())
    }
}
