//! Open BVM ventilator control core.
//!
//! Keeps the derived stepper-motor and timing values consistent with the
//! clinician-set control parameters, persists settings and safety limits,
//! and tracks alarm transitions.  Everything here is pure logic behind port
//! traits and runs on the host; ESP-IDF-specific code is guarded by the
//! `espidf` feature inside the adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod persistence;
pub mod safety;

pub use app::service::ControllerState;
pub use error::{Error, Result};
