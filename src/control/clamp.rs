//! Input stepping with clamping.
//!
//! The input layer moves a setting one step per encoder detent / button
//! press.  [`clamp_input_value`] is the only boundary between raw operator
//! input and the setters, so it must never return a value outside `[lo, hi]`.

/// Direction of one input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Map a signed encoder delta to a direction.  Zero counts as `Down`.
    pub fn from_delta(delta: i8) -> Self {
        if delta > 0 { Self::Up } else { Self::Down }
    }
}

/// Move `value` one `step` in `dir`, then clamp into `[lo, hi]`.
///
/// Arithmetic saturates, so a step that would overflow `i32` still lands on
/// the nearest bound.  `lo` wins if the bounds are inverted.
pub fn clamp_input_value(value: i32, step: i32, dir: Direction, lo: i32, hi: i32) -> i32 {
    let moved = match dir {
        Direction::Up => value.saturating_add(step),
        Direction::Down => value.saturating_sub(step),
    };
    if moved > hi {
        return hi.max(lo);
    }
    if moved < lo {
        return lo;
    }
    moved
}
