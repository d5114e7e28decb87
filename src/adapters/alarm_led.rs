//! Alarm LED adapter.
//!
//! Implements [`AlarmIndicator`] over any `embedded-hal` output pin: the LED
//! is lit while an alarm is active and dark once `NoAlarm` is raised.
//! On ESP-IDF the pin is an `esp_idf_hal` `PinDriver`; tests use a mock pin.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::AlarmIndicator;
use crate::safety::AlarmCode;

pub struct AlarmLed<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> AlarmLed<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("AlarmLed: initial set_low failed");
        }
        Self { pin, lit: false }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> AlarmIndicator for AlarmLed<P> {
    fn alarm_changed(&mut self, code: AlarmCode) {
        let on = code.is_alarm();
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.lit = on,
            Err(_) => warn!("AlarmLed: pin write failed for {code}"),
        }
    }
}
