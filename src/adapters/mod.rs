//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                     |
//! |-------------|----------------|---------------------------------|
//! | `eeprom`    | RecordStore    | NVS blob / in-memory byte image |
//! | `alarm_led` | AlarmIndicator | any embedded-hal output pin     |
//! | `log_sink`  | EventSink      | Serial log output               |

pub mod alarm_led;
pub mod eeprom;
pub mod log_sink;
