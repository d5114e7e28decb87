//! Derived motion and timing values.
//!
//! [`LiveValues`] is a pure function of [`ControlSettings`] and the
//! [`MechanicalProfile`].  Changing one setting only invalidates part of it,
//! so the dependency graph is kept as data: [`recompute_steps`] maps each
//! setting to the ordered list of [`Recompute`] steps that must run, and
//! [`propagate`] executes them.
//!
//! ```text
//! start_position ──▶ full_press_steps ──┬─▶ tidal_steps
//!                                       ├─▶ volume_per_revolution ──▶ {insp_rpm, exp_rpm}
//! full_press_volume ────────────────────┼─▶ steps_400
//!                                       └─▶ steps_600
//! tidal_volume ─────▶ {tidal_steps, minute_ventilation}
//! respiratory_rate ─▶ breath_cycle_time ──▶ inspiratory_time ; minute_ventilation
//! respiratory_ratio ▶ inspiratory_time
//! inspiratory_flow ─▶ inspiratory_rpm      (current volume_per_revolution)
//! expiratory_flow ──▶ expiratory_rpm       (current volume_per_revolution)
//! ```
//!
//! ## Preconditions
//!
//! `respiratory_rate`, `full_press_volume` and `end_position - start_position`
//! must be non-zero, and `start_position` must not exceed `end_position`.
//! The input ranges in [`Setting::range`] guarantee this; nothing here checks
//! it again.

use crate::config::{ControlSettings, MechanicalProfile, Setting};

/// Reference volumes (mL) shown on the calibration page.
pub const CALIBRATION_VOLUME_LOW: u16 = 400;
pub const CALIBRATION_VOLUME_HIGH: u16 = 600;

/// Values derived from the control settings.  Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveValues {
    /// Steps between start position and the end stop.
    pub full_press_steps: u32,
    /// Steps needed to deliver the tidal volume.
    pub tidal_steps: u32,
    /// mL displaced per motor revolution.
    pub volume_per_revolution: f32,
    pub steps_400: u32,
    pub steps_600: u32,
    pub inspiratory_rpm: u32,
    pub expiratory_rpm: u32,
    /// Milliseconds per breath.
    pub breath_cycle_time: u32,
    /// Milliseconds of inspiration per breath.
    pub inspiratory_time: u32,
    /// mL per minute.
    pub minute_ventilation: u32,
    /// Display mirror of the tidal volume, refreshed at startup and reset.
    pub volume: u16,
    /// Display mirror of the plateau pressure, refreshed at startup and reset.
    pub pressure: u16,
}

impl LiveValues {
    /// Evaluate every derived value from scratch and refresh the display
    /// mirrors.
    pub fn derive(settings: &ControlSettings, profile: &MechanicalProfile) -> Self {
        let mut live = Self::default();
        propagate(&mut live, settings, profile, Recompute::FULL_PASS);
        live.refresh_mirrors(settings);
        live
    }

    /// Copy the display mirrors from the settings.
    pub fn refresh_mirrors(&mut self, settings: &ControlSettings) {
        self.volume = settings.tidal_volume;
        self.pressure = settings.plateau_airway_pressure;
    }

    /// Steps needed to push `volume` mL with the current full press.
    pub fn steps_for_volume(&self, settings: &ControlSettings, volume: u16) -> u32 {
        self.full_press_steps * u32::from(volume) / u32::from(settings.full_press_volume)
    }
}

/// One node of the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    FullPressSteps,
    TidalSteps,
    VolumePerRevolution,
    InspiratoryRpm,
    ExpiratoryRpm,
    Steps400,
    Steps600,
    BreathCycleTime,
    InspiratoryTime,
    MinuteVentilation,
}

impl Recompute {
    /// Every node in dependency order.
    pub const FULL_PASS: &'static [Recompute] = &[
        Recompute::FullPressSteps,
        Recompute::TidalSteps,
        Recompute::VolumePerRevolution,
        Recompute::InspiratoryRpm,
        Recompute::ExpiratoryRpm,
        Recompute::Steps400,
        Recompute::Steps600,
        Recompute::BreathCycleTime,
        Recompute::InspiratoryTime,
        Recompute::MinuteVentilation,
    ];

    /// Recompute this node from the settings and the upstream nodes already
    /// held in `live`.
    pub fn apply(self, live: &mut LiveValues, settings: &ControlSettings, profile: &MechanicalProfile) {
        match self {
            Recompute::FullPressSteps => {
                live.full_press_steps = profile.end_position - u32::from(settings.start_position);
            }
            Recompute::TidalSteps => {
                live.tidal_steps = live.steps_for_volume(settings, settings.tidal_volume);
            }
            Recompute::VolumePerRevolution => {
                // Quotient truncates before widening to f32.
                let quotient = u32::from(settings.full_press_volume) * profile.steps_per_revolution
                    / live.full_press_steps;
                live.volume_per_revolution = quotient as f32;
            }
            Recompute::InspiratoryRpm => {
                live.inspiratory_rpm = rpm_for_flow(settings.inspiratory_flow, live.volume_per_revolution);
            }
            Recompute::ExpiratoryRpm => {
                live.expiratory_rpm = rpm_for_flow(settings.expiratory_flow, live.volume_per_revolution);
            }
            Recompute::Steps400 => {
                live.steps_400 = live.steps_for_volume(settings, CALIBRATION_VOLUME_LOW);
            }
            Recompute::Steps600 => {
                live.steps_600 = live.steps_for_volume(settings, CALIBRATION_VOLUME_HIGH);
            }
            Recompute::BreathCycleTime => {
                live.breath_cycle_time = 60_000 / u32::from(settings.respiratory_rate);
            }
            Recompute::InspiratoryTime => {
                live.inspiratory_time =
                    live.breath_cycle_time / (u32::from(settings.respiratory_ratio) + 1);
            }
            Recompute::MinuteVentilation => {
                live.minute_ventilation =
                    u32::from(settings.tidal_volume) * u32::from(settings.respiratory_rate);
            }
        }
    }
}

/// The dependency table: which nodes a change to `setting` invalidates, in
/// evaluation order.
pub const fn recompute_steps(setting: Setting) -> &'static [Recompute] {
    type R = Recompute;
    match setting {
        Setting::StartPosition => &[
            R::FullPressSteps,
            R::TidalSteps,
            R::VolumePerRevolution,
            R::InspiratoryRpm,
            R::ExpiratoryRpm,
            R::Steps400,
            R::Steps600,
        ],
        Setting::FullPressVolume => &[
            R::TidalSteps,
            R::VolumePerRevolution,
            R::InspiratoryRpm,
            R::ExpiratoryRpm,
            R::Steps400,
            R::Steps600,
        ],
        Setting::TidalVolume => &[R::TidalSteps, R::MinuteVentilation],
        Setting::RespiratoryRate => &[R::BreathCycleTime, R::InspiratoryTime, R::MinuteVentilation],
        Setting::RespiratoryRatio => &[R::InspiratoryTime],
        Setting::InspiratoryFlow => &[R::InspiratoryRpm],
        Setting::ExpiratoryFlow => &[R::ExpiratoryRpm],
        Setting::PlateauAirwayPressure | Setting::TriggerPressure => &[],
    }
}

/// Run `steps` in order against `live`.
pub fn propagate(
    live: &mut LiveValues,
    settings: &ControlSettings,
    profile: &MechanicalProfile,
    steps: &[Recompute],
) {
    for step in steps {
        step.apply(live, settings, profile);
    }
}

/// Motor RPM for a flow, given mL per revolution.
fn rpm_for_flow(flow: u16, volume_per_revolution: f32) -> u32 {
    ((u32::from(flow) * 1000) as f32 / volume_per_revolution) as u32
}
