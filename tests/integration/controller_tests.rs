//! Integration tests for ControllerState setters, factory reset and
//! command dispatch.

use crate::mock_hw::{MockIndicator, MockStore, RecordingSink};

use bvm_ventilator::app::commands::ControlCommand;
use bvm_ventilator::app::events::AppEvent;
use bvm_ventilator::app::ports::StorageError;
use bvm_ventilator::config::{ControlSettings, Limit, MechanicalProfile, SafetyLimits, Setting};
use bvm_ventilator::control::clamp::Direction;
use bvm_ventilator::control::derivation::LiveValues;
use bvm_ventilator::persistence::{LIMITS_OFFSET, SETTINGS_OFFSET, SETTINGS_RECORD_SIZE};
use bvm_ventilator::safety::AlarmCode;
use bvm_ventilator::{ControllerState, Error};

fn make_controller() -> (ControllerState, MockStore) {
    let mut store = MockStore::new();
    let mut state = ControllerState::default();
    state.factory_reset(&mut store).unwrap();
    store.writes.clear();
    (state, store)
}

/// Names of the live fields that differ (floats compared bit-for-bit).
fn changed_fields(a: &LiveValues, b: &LiveValues) -> Vec<&'static str> {
    let mut out = Vec::new();
    if a.full_press_steps != b.full_press_steps {
        out.push("full_press_steps");
    }
    if a.tidal_steps != b.tidal_steps {
        out.push("tidal_steps");
    }
    if a.volume_per_revolution.to_bits() != b.volume_per_revolution.to_bits() {
        out.push("volume_per_revolution");
    }
    if a.inspiratory_rpm != b.inspiratory_rpm {
        out.push("inspiratory_rpm");
    }
    if a.expiratory_rpm != b.expiratory_rpm {
        out.push("expiratory_rpm");
    }
    if a.steps_400 != b.steps_400 {
        out.push("steps_400");
    }
    if a.steps_600 != b.steps_600 {
        out.push("steps_600");
    }
    if a.breath_cycle_time != b.breath_cycle_time {
        out.push("breath_cycle_time");
    }
    if a.inspiratory_time != b.inspiratory_time {
        out.push("inspiratory_time");
    }
    if a.minute_ventilation != b.minute_ventilation {
        out.push("minute_ventilation");
    }
    if a.volume != b.volume {
        out.push("volume");
    }
    if a.pressure != b.pressure {
        out.push("pressure");
    }
    out
}

// ── Factory reset ────────────────────────────────────────────

#[test]
fn factory_reset_installs_reference_values() {
    let (state, _) = make_controller();

    assert_eq!(*state.settings(), ControlSettings::default());
    let l = state.limits();
    assert_eq!(l.pressure, Limit::new(50, 400));
    assert_eq!(l.ventilation, Limit::new(3000, 8000));
    assert_eq!(l.volume, Limit::new(180, 750));

    let live = state.live();
    assert_eq!(live.breath_cycle_time, 5000);
    assert_eq!(live.inspiratory_time, 1250);
    assert_eq!(live.minute_ventilation, 5400);
    assert_eq!(live.volume, 450);
    assert_eq!(live.pressure, 300);
}

#[test]
fn factory_reset_persists_both_records() {
    let mut store = MockStore::new();
    let mut state = ControllerState::default();
    state.factory_reset(&mut store).unwrap();

    assert_eq!(store.writes.len(), 2);
    assert_eq!(store.writes[0].0, SETTINGS_OFFSET);
    assert_eq!(store.writes[1].0, LIMITS_OFFSET);

    let reloaded = ControllerState::load(&store, MechanicalProfile::default()).unwrap();
    assert_eq!(reloaded.settings(), state.settings());
    assert_eq!(reloaded.limits(), state.limits());
}

#[test]
fn factory_reset_restores_mirrors_and_keeps_alarms() {
    let (mut state, mut store) = make_controller();
    let mut led = MockIndicator::default();

    state.set_tidal_volume(600, &mut store).unwrap();
    state.set_plateau_airway_pressure(200, &mut store).unwrap();
    state.raise_alarm(AlarmCode::HighVolume, &mut led);

    state.factory_reset(&mut store).unwrap();

    assert_eq!(state.live().volume, 450);
    assert_eq!(state.live().pressure, 300);
    assert_eq!(state.alarm(), AlarmCode::HighVolume);
    assert_eq!(state.history().len(), 1);
}

#[test]
fn factory_reset_with_failed_limits_write_leaves_limits_stale() {
    let (mut state, mut store) = make_controller();
    let custom = SafetyLimits {
        volume: Limit::new(200, 700),
        ..SafetyLimits::default()
    };
    state.set_limits(custom, &mut store).unwrap();
    state.set_tidal_volume(600, &mut store).unwrap();
    store.writes.clear();

    store.fail_after = Some(1);
    assert_eq!(
        state.factory_reset(&mut store),
        Err(Error::Storage(StorageError::IoError))
    );
    assert_eq!(*state.settings(), ControlSettings::default());
    assert_eq!(*state.limits(), SafetyLimits::default());
    assert_eq!(store.writes, vec![(SETTINGS_OFFSET, store.writes[0].1)]);

    store.fail_after = None;
    let reloaded = ControllerState::load(&store, MechanicalProfile::default()).unwrap();
    assert_eq!(*reloaded.settings(), ControlSettings::default());
    assert_eq!(*reloaded.limits(), custom);
}

// ── Dependency minimality ────────────────────────────────────

#[test]
fn each_setter_changes_only_its_dependents() {
    let cases: &[(Setting, u16, &[&str])] = &[
        (
            Setting::StartPosition,
            600,
            &[
                "full_press_steps",
                "tidal_steps",
                "volume_per_revolution",
                "inspiratory_rpm",
                "expiratory_rpm",
                "steps_400",
                "steps_600",
            ],
        ),
        (
            Setting::FullPressVolume,
            900,
            &[
                "tidal_steps",
                "volume_per_revolution",
                "inspiratory_rpm",
                "expiratory_rpm",
                "steps_400",
                "steps_600",
            ],
        ),
        (Setting::TidalVolume, 500, &["tidal_steps", "minute_ventilation"]),
        (
            Setting::RespiratoryRate,
            15,
            &["breath_cycle_time", "inspiratory_time", "minute_ventilation"],
        ),
        (Setting::RespiratoryRatio, 1, &["inspiratory_time"]),
        (Setting::InspiratoryFlow, 50, &["inspiratory_rpm"]),
        (Setting::ExpiratoryFlow, 20, &["expiratory_rpm"]),
        (Setting::PlateauAirwayPressure, 200, &[]),
        (Setting::TriggerPressure, 25, &[]),
    ];

    for (setting, value, expected) in cases {
        let (mut state, mut store) = make_controller();
        let before = *state.live();
        state.set(*setting, *value, &mut store).unwrap();
        let after = *state.live();

        assert_eq!(
            changed_fields(&before, &after),
            expected.to_vec(),
            "unexpected live changes for {setting}"
        );
    }
}

#[test]
fn setters_match_closed_form_except_mirrors() {
    let (mut state, mut store) = make_controller();
    state.set_start_position(700, &mut store).unwrap();
    state.set_full_press_volume(1000, &mut store).unwrap();
    state.set_tidal_volume(520, &mut store).unwrap();
    state.set_respiratory_rate(18, &mut store).unwrap();
    state.set_respiratory_ratio(2, &mut store).unwrap();
    state.set_inspiratory_flow(60, &mut store).unwrap();
    state.set_expiratory_flow(45, &mut store).unwrap();
    state.set_trigger_pressure(10, &mut store).unwrap();

    let mut expected = LiveValues::derive(state.settings(), state.profile());
    // Mirrors only refresh at startup and reset.
    expected.volume = 450;
    expected.pressure = 300;
    assert_eq!(*state.live(), expected);
}

#[test]
fn start_position_values() {
    let (mut state, mut store) = make_controller();
    state.set_start_position(600, &mut store).unwrap();
    let live = state.live();
    assert_eq!(live.full_press_steps, 2600);
    assert_eq!(live.tidal_steps, 1376);
    assert_eq!(live.volume_per_revolution, 523.0);
    assert_eq!(live.inspiratory_rpm, 66);
    assert_eq!(live.steps_400, 1223);
    assert_eq!(live.steps_600, 1835);
}

// ── Write-through and atomicity ──────────────────────────────

#[test]
fn every_setter_writes_the_settings_record() {
    let (mut state, mut store) = make_controller();
    state.set_respiratory_rate(20, &mut store).unwrap();
    state.set_ventilation_active(true, &mut store).unwrap();
    assert_eq!(
        store.writes,
        vec![
            (SETTINGS_OFFSET, SETTINGS_RECORD_SIZE),
            (SETTINGS_OFFSET, SETTINGS_RECORD_SIZE)
        ]
    );

    let reloaded = ControllerState::load(&store, MechanicalProfile::default()).unwrap();
    assert_eq!(reloaded.settings().respiratory_rate, 20);
    assert!(reloaded.settings().ventilation_active);
}

#[test]
fn failed_write_rolls_back() {
    let (mut state, mut store) = make_controller();
    let settings = *state.settings();
    let live = *state.live();

    store.fail_writes = true;
    assert_eq!(
        state.set_start_position(900, &mut store),
        Err(Error::Storage(StorageError::IoError))
    );
    assert_eq!(*state.settings(), settings);
    assert_eq!(*state.live(), live);

    assert!(state.set_ventilation_active(true, &mut store).is_err());
    assert!(!state.settings().ventilation_active);
}

// ── Limits ───────────────────────────────────────────────────

#[test]
fn set_limits_validates_and_persists() {
    let (mut state, mut store) = make_controller();
    let bad = SafetyLimits {
        pressure: Limit::new(300, 100),
        ..SafetyLimits::default()
    };
    assert!(matches!(state.set_limits(bad, &mut store), Err(Error::InvalidLimits(_))));
    assert!(store.writes.is_empty());

    let good = SafetyLimits {
        volume: Limit::new(200, 700),
        ..SafetyLimits::default()
    };
    state.set_limits(good, &mut store).unwrap();
    assert_eq!(store.writes, vec![(LIMITS_OFFSET, store.writes[0].1)]);
    let reloaded = ControllerState::load(&store, MechanicalProfile::default()).unwrap();
    assert_eq!(reloaded.limits().volume, Limit::new(200, 700));
}

// ── Commands ─────────────────────────────────────────────────

#[test]
fn step_command_emits_setting_changed() {
    let (mut state, mut store) = make_controller();
    let mut led = MockIndicator::default();
    let mut sink = RecordingSink::default();

    state
        .handle_command(
            ControlCommand::Step(Setting::TidalVolume, Direction::Up),
            &mut store,
            &mut led,
            &mut sink,
        )
        .unwrap();

    assert_eq!(state.settings().tidal_volume, 460);
    match &sink.events[..] {
        [AppEvent::SettingChanged { setting, value, live }] => {
            assert_eq!(*setting, Setting::TidalVolume);
            assert_eq!(*value, 460);
            assert_eq!(live.minute_ventilation, 460 * 12);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn set_command_rejects_out_of_range() {
    let (mut state, mut store) = make_controller();
    let mut led = MockIndicator::default();
    let mut sink = RecordingSink::default();

    let err = state
        .handle_command(
            ControlCommand::Set(Setting::RespiratoryRate, 0),
            &mut store,
            &mut led,
            &mut sink,
        )
        .unwrap_err();

    assert_eq!(err, Error::OutOfRange(Setting::RespiratoryRate));
    assert_eq!(state.settings().respiratory_rate, 12);
    assert!(sink.events.is_empty());
    assert!(store.writes.is_empty());
}

#[test]
fn repeated_step_saturates_at_bound() {
    let (mut state, mut store) = make_controller();
    for _ in 0..100 {
        state.step(Setting::RespiratoryRatio, Direction::Up, &mut store).unwrap();
    }
    assert_eq!(state.settings().respiratory_ratio, 4);
    for _ in 0..100 {
        state.step(Setting::RespiratoryRatio, Direction::Down, &mut store).unwrap();
    }
    assert_eq!(state.settings().respiratory_ratio, 1);
}

#[test]
fn factory_reset_command_emits_event() {
    let (mut state, mut store) = make_controller();
    let mut led = MockIndicator::default();
    let mut sink = RecordingSink::default();

    state.set_respiratory_rate(30, &mut store).unwrap();
    state
        .handle_command(ControlCommand::FactoryReset, &mut store, &mut led, &mut sink)
        .unwrap();

    assert_eq!(state.settings().respiratory_rate, 12);
    assert_eq!(sink.events, vec![AppEvent::FactoryReset]);
}
