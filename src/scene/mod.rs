//! Scene Module
//!
//! [`SceneManager`] owns the active model, switches between the configured
//! models, resolves taps against hit areas and drives each frame's update and
//! draw.

pub mod manager;

pub use manager::{
    MOTION_GROUP_TAP, MOTION_GROUP_TAP_BODY, MOTION_GROUP_TAP_LEFT, MOTION_GROUP_TAP_RIGHT, SceneManager,
};
