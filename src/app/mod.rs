//! Application core — controller state and its port boundary.
//!
//! [`service::ControllerState`] owns the settings, limits, live values and
//! alarm history.  All interaction with storage, indicators and logging
//! happens through the **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
