//! Pure control arithmetic: the settings → live-values derivation and the
//! input clamp used before any setter runs.

pub mod clamp;
pub mod derivation;
