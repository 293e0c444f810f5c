//! Utility Module
//!
//! - [`FrameClock`]: per-frame delta time source
//! - [`easing_sine`]: the sine ease used by motion and expression fades

pub mod time;

pub use time::FrameClock;

/// Sine easing over `[0, 1]`, clamped outside that range.
#[inline]
#[must_use]
pub fn easing_sine(value: f32) -> f32 {
    if value < 0.0 {
        0.0
    } else if value > 1.0 {
        1.0
    } else {
        0.5 - 0.5 * (value * std::f32::consts::PI).cos()
    }
}
