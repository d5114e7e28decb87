//! Controller state — the hexagonal core.
//!
//! [`ControllerState`] owns the control settings, the safety limits, the
//! derived live values and the alarm tracker.  Every operation runs to
//! completion on the caller's thread; ports are passed in at each call
//! site.
//!
//! ```text
//!  input / safety loop ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                          │       ControllerState         │
//!      RecordStore ◀──────▶│ settings · limits · live      │ ──▶ AlarmIndicator
//!                          │ alarm tracker                 │
//!                          └──────────────────────────────┘
//! ```
//!
//! ## Setter contract
//!
//! A setter stores one value, runs exactly the recompute steps listed for it
//! in [`recompute_steps`], then writes the settings record through.  If the
//! write fails the in-memory settings and live values are restored to what
//! they were before the call and the error is returned.
//!
//! The unchecked setters expect values already clamped by
//! [`clamp_input_value`]; [`ControllerState::try_set`] checks the range
//! itself.

use log::{debug, info, warn};

use crate::config::{ControlSettings, MechanicalProfile, SafetyLimits, Setting};
use crate::control::clamp::{Direction, clamp_input_value};
use crate::control::derivation::{LiveValues, propagate, recompute_steps};
use crate::error::{Error, Result};
use crate::events::EventHistory;
use crate::persistence::{load_record, store_record};
use crate::safety::{AlarmCode, AlarmTracker, LimitMonitor, Readings};

use super::commands::ControlCommand;
use super::events::AppEvent;
use super::ports::{AlarmIndicator, EventSink, RecordStore};

// ───────────────────────────────────────────────────────────────
// ControllerState
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ControllerState {
    settings: ControlSettings,
    limits: SafetyLimits,
    live: LiveValues,
    alarms: AlarmTracker,
    profile: MechanicalProfile,
}

impl Default for ControllerState {
    /// Factory settings in memory only; nothing is persisted.
    fn default() -> Self {
        Self::from_records(
            ControlSettings::default(),
            SafetyLimits::default(),
            MechanicalProfile::default(),
        )
    }
}

impl ControllerState {
    /// Build a state from records already in hand, with live values fully
    /// derived and alarms cleared.
    pub fn from_records(
        settings: ControlSettings,
        limits: SafetyLimits,
        profile: MechanicalProfile,
    ) -> Self {
        Self {
            live: LiveValues::derive(&settings, &profile),
            settings,
            limits,
            alarms: AlarmTracker::new(),
            profile,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Startup: read both records, check them and rebuild the live values.
    ///
    /// Records are validated before anything is derived, so a record that
    /// decodes but holds unusable values comes back as an error instead of
    /// reaching the derivations.  Use [`load_or_reset`] when the storage may
    /// be blank or corrupt.
    ///
    /// [`load_or_reset`]: Self::load_or_reset
    pub fn load(store: &impl RecordStore, profile: MechanicalProfile) -> Result<Self> {
        let settings: ControlSettings = load_record(store)?;
        let limits: SafetyLimits = load_record(store)?;
        check_records(&settings, &limits, &profile)?;
        info!("Controller: settings loaded ({settings:?})");
        Ok(Self::from_records(settings, limits, profile))
    }

    /// Startup with recovery: if either record fails to decode or holds
    /// values that would break the derivations, install and persist the
    /// factory defaults instead.  Storage errors are returned as-is.
    pub fn load_or_reset(store: &mut impl RecordStore, profile: MechanicalProfile) -> Result<Self> {
        match Self::load(&*store, profile) {
            Ok(state) => Ok(state),
            Err(Error::Storage(e)) => Err(Error::Storage(e)),
            Err(e) => {
                warn!("Controller: stored records unusable ({e}), restoring factory defaults");
                let mut state = Self::from_records(
                    ControlSettings::default(),
                    SafetyLimits::default(),
                    profile,
                );
                state.factory_reset(store)?;
                Ok(state)
            }
        }
    }

    /// Install factory settings and limits, rebuild every live value,
    /// refresh the display mirrors and persist both records.
    ///
    /// The settings record is written first.  If the limits write then
    /// fails, memory holds the full defaults but the stored limits record
    /// is still the old one.  The alarm state and history are left
    /// untouched.
    pub fn factory_reset(&mut self, store: &mut impl RecordStore) -> Result<()> {
        self.settings = ControlSettings::default();
        self.limits = SafetyLimits::default();
        self.live = LiveValues::derive(&self.settings, &self.profile);

        if let Err(e) = store_record(store, &self.settings) {
            warn!("Controller: factory reset not persisted ({e}), stored records unchanged");
            return Err(e);
        }
        if let Err(e) = store_record(store, &self.limits) {
            warn!("Controller: factory reset persisted settings only ({e}), stored limits are stale");
            return Err(e);
        }
        info!("Controller: factory reset complete");
        Ok(())
    }

    // ── Setters ───────────────────────────────────────────────

    /// Store `value` for `setting`, recompute its dependents and write the
    /// settings record through.
    pub fn set(&mut self, setting: Setting, value: u16, store: &mut impl RecordStore) -> Result<()> {
        let prev_settings = self.settings;
        let prev_live = self.live;

        self.settings.put(setting, value);
        propagate(
            &mut self.live,
            &self.settings,
            &self.profile,
            recompute_steps(setting),
        );

        if let Err(e) = store_record(store, &self.settings) {
            warn!("Controller: persisting {setting} failed ({e}), change rolled back");
            self.settings = prev_settings;
            self.live = prev_live;
            return Err(e);
        }

        debug!("Controller: {setting} = {value}");
        Ok(())
    }

    /// Like [`set`](Self::set), but rejects values outside the setting's
    /// input range before touching any state.
    pub fn try_set(&mut self, setting: Setting, value: u16, store: &mut impl RecordStore) -> Result<()> {
        if !setting.range().contains(value) {
            warn!("Controller: rejected {setting} = {value}");
            return Err(Error::OutOfRange(setting));
        }
        self.set(setting, value, store)
    }

    /// Move `setting` one input step in `dir`, clamped to its range.
    /// Returns the value stored.
    pub fn step(&mut self, setting: Setting, dir: Direction, store: &mut impl RecordStore) -> Result<u16> {
        let range = setting.range();
        let next = clamp_input_value(
            i32::from(self.settings.get(setting)),
            i32::from(range.step),
            dir,
            i32::from(range.lo),
            i32::from(range.hi),
        ) as u16;
        self.set(setting, next, store)?;
        Ok(next)
    }

    pub fn set_start_position(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::StartPosition, value, store)
    }

    pub fn set_full_press_volume(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::FullPressVolume, value, store)
    }

    pub fn set_tidal_volume(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::TidalVolume, value, store)
    }

    pub fn set_respiratory_rate(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::RespiratoryRate, value, store)
    }

    pub fn set_respiratory_ratio(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::RespiratoryRatio, value, store)
    }

    pub fn set_plateau_airway_pressure(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::PlateauAirwayPressure, value, store)
    }

    pub fn set_inspiratory_flow(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::InspiratoryFlow, value, store)
    }

    pub fn set_expiratory_flow(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::ExpiratoryFlow, value, store)
    }

    pub fn set_trigger_pressure(&mut self, value: u16, store: &mut impl RecordStore) -> Result<()> {
        self.set(Setting::TriggerPressure, value, store)
    }

    /// Start or stop ventilation.  No derived values depend on this flag.
    pub fn set_ventilation_active(&mut self, active: bool, store: &mut impl RecordStore) -> Result<()> {
        let prev = self.settings.ventilation_active;
        self.settings.ventilation_active = active;
        if let Err(e) = store_record(store, &self.settings) {
            self.settings.ventilation_active = prev;
            return Err(e);
        }
        info!("Controller: ventilation {}", if active { "started" } else { "stopped" });
        Ok(())
    }

    /// Replace the alarm bounds after checking each pair.
    pub fn set_limits(&mut self, limits: SafetyLimits, store: &mut impl RecordStore) -> Result<()> {
        limits.validate()?;
        store_record(store, &limits)?;
        self.limits = limits;
        info!("Controller: safety limits updated ({limits:?})");
        Ok(())
    }

    // ── Alarms ────────────────────────────────────────────────

    /// Make `code` the active alarm.  Returns `true` if it changed.
    pub fn raise_alarm(&mut self, code: AlarmCode, indicator: &mut impl AlarmIndicator) -> bool {
        self.alarms.raise(code, indicator)
    }

    /// Compare `readings` against the safety limits and raise the result.
    pub fn check_readings(&mut self, readings: &Readings, indicator: &mut impl AlarmIndicator) -> AlarmCode {
        let code = LimitMonitor::evaluate(readings, &self.limits);
        self.alarms.raise(code, indicator);
        code
    }

    /// Run the limit check against the display mirrors and minute
    /// ventilation.
    ///
    /// The `volume` and `pressure` mirrors stand in for measured values and
    /// only refresh at startup and factory reset, so a setter change to
    /// tidal volume or plateau pressure is not seen here until then.
    /// Minute ventilation is always current.  Use [`check_readings`] with
    /// sensor values when they are available.
    ///
    /// [`check_readings`]: Self::check_readings
    pub fn check_limits(&mut self, indicator: &mut impl AlarmIndicator) -> AlarmCode {
        let readings = Readings::from_live(&self.live);
        self.check_readings(&readings, indicator)
    }

    /// Explicit reinitialisation of the alarm state and history.
    pub fn clear_alarms(&mut self) {
        self.alarms.reset();
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        store: &mut impl RecordStore,
        indicator: &mut impl AlarmIndicator,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            ControlCommand::Set(setting, value) => {
                self.try_set(setting, value, store)?;
                self.emit_setting(setting, sink);
            }
            ControlCommand::Step(setting, dir) => {
                self.step(setting, dir, store)?;
                self.emit_setting(setting, sink);
            }
            ControlCommand::SetVentilationActive(active) => {
                self.set_ventilation_active(active, store)?;
                sink.emit(&AppEvent::VentilationChanged(active));
            }
            ControlCommand::SetLimits(limits) => {
                self.set_limits(limits, store)?;
                sink.emit(&AppEvent::LimitsChanged(limits));
            }
            ControlCommand::FactoryReset => {
                self.factory_reset(store)?;
                sink.emit(&AppEvent::FactoryReset);
            }
            ControlCommand::RaiseAlarm(code) => {
                let from = self.alarms.current();
                if self.raise_alarm(code, indicator) {
                    sink.emit(&AppEvent::AlarmChanged { from, to: code });
                }
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn live(&self) -> &LiveValues {
        &self.live
    }

    pub fn profile(&self) -> &MechanicalProfile {
        &self.profile
    }

    pub fn alarm(&self) -> AlarmCode {
        self.alarms.current()
    }

    pub fn history(&self) -> &EventHistory {
        self.alarms.history()
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit_setting(&self, setting: Setting, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::SettingChanged {
            setting,
            value: self.settings.get(setting),
            live: self.live,
        });
    }
}

/// Reject records whose values would break the derivations or the alarm
/// bounds.
fn check_records(
    settings: &ControlSettings,
    limits: &SafetyLimits,
    profile: &MechanicalProfile,
) -> Result<()> {
    settings.validate()?;
    limits.validate()?;
    if u32::from(settings.start_position) >= profile.end_position {
        return Err(Error::OutOfRange(Setting::StartPosition));
    }
    Ok(())
}
