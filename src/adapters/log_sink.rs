//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events to the logger
//! (UART / USB-CDC in production).  A display adapter would implement the
//! same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::SettingChanged { setting, value, live } => {
                info!(
                    "SET | {}={} | steps={}/{} | rpm={}/{} | cycle={}ms insp={}ms | MV={}mL/min",
                    setting,
                    value,
                    live.tidal_steps,
                    live.full_press_steps,
                    live.inspiratory_rpm,
                    live.expiratory_rpm,
                    live.breath_cycle_time,
                    live.inspiratory_time,
                    live.minute_ventilation,
                );
            }
            AppEvent::VentilationChanged(active) => {
                info!("VENT | {}", if *active { "ON" } else { "OFF" });
            }
            AppEvent::LimitsChanged(l) => {
                info!(
                    "LIMITS | P={}..{} | MV={}..{} | V={}..{}",
                    l.pressure.minimum,
                    l.pressure.maximum,
                    l.ventilation.minimum,
                    l.ventilation.maximum,
                    l.volume.minimum,
                    l.volume.maximum,
                );
            }
            AppEvent::FactoryReset => {
                info!("RESET | factory defaults installed");
            }
            AppEvent::AlarmChanged { from, to } => {
                if to.is_alarm() {
                    warn!("ALARM | {} -> {}", from, to);
                } else {
                    info!("ALARM | {} cleared", from);
                }
            }
        }
    }
}
