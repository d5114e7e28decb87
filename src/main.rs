//! Open BVM Ventilator — firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  BlockStore (NVS)   AlarmLed (GPIO)   LogEventSink (UART)    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          ControllerState (pure logic)                  │  │
//! │  │  settings · derivations · limits · alarm history       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Input handling, display and motor pulse generation run in their own
//! tasks and talk to the controller through the same ports; this loop only
//! boots the controller and runs the periodic limit check.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use bvm_ventilator::ControllerState;
use bvm_ventilator::adapters::alarm_led::AlarmLed;
use bvm_ventilator::adapters::eeprom::BlockStore;
use bvm_ventilator::adapters::log_sink::LogEventSink;
use bvm_ventilator::app::events::AppEvent;
use bvm_ventilator::app::ports::EventSink;
use bvm_ventilator::config::MechanicalProfile;

/// Period of the safety-monitor loop.
const MONITOR_INTERVAL: Duration = Duration::from_millis(1000);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Open BVM Ventilator v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let mut led = AlarmLed::new(PinDriver::output(peripherals.pins.gpio2)?);
    let mut sink = LogEventSink::new();

    // ── 3. Settings (or factory defaults) ─────────────────────
    let mut store = BlockStore::open().map_err(|e| anyhow::anyhow!("record store: {e}"))?;
    let mut controller = ControllerState::load_or_reset(&mut store, MechanicalProfile::default())
        .map_err(|e| anyhow::anyhow!("controller init: {e}"))?;

    let live = controller.live();
    info!(
        "Live | press={} steps | tidal={} steps | rpm={}/{} | cycle={}ms insp={}ms | MV={}mL/min",
        live.full_press_steps,
        live.tidal_steps,
        live.inspiratory_rpm,
        live.expiratory_rpm,
        live.breath_cycle_time,
        live.inspiratory_time,
        live.minute_ventilation,
    );

    // ── 4. Safety monitor loop ────────────────────────────────
    loop {
        let from = controller.alarm();
        let to = controller.check_limits(&mut led);
        if to != from {
            sink.emit(&AppEvent::AlarmChanged { from, to });
        }

        if controller.settings().ventilation_active && to.is_alarm() {
            warn!("Alarm active while ventilating: {to}");
        }

        std::thread::sleep(MONITOR_INTERVAL);
    }
}
