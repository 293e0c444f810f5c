//! Platform-agnostic pointer input
//!
//! The host translates its mouse/touch events into device-pixel coordinates;
//! [`TouchManager`] tracks the gesture and [`ViewTransform`] maps device
//! pixels into the logical space the scene works in.

pub mod touch;
pub mod view;

pub use touch::{TouchManager, moving_amount};
pub use view::ViewTransform;
