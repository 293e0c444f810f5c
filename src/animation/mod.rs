//! Animation Module
//!
//! - [`curve`]: motion3.json segment curves
//! - [`MotionClip`] / [`ExpressionClip`]: parsed motion and expression data
//! - [`MotionManager`]: priority-gated, cross-fading motion queue
//! - [`EyeBlink`], [`Breath`], [`Pose`], [`TargetPoint`]: procedural layers

pub mod action;
pub mod clip;
pub mod curve;
pub mod drag;
pub mod effects;
pub mod expression;
pub mod manager;
pub mod pose;

pub use action::{ClipSlot, FinishCallback, MotionEntry, MotionHandle};
pub use clip::{CurveTarget, MotionClip, MotionCurve};
pub use curve::{SegmentCurve, SegmentKind};
pub use drag::TargetPoint;
pub use effects::{BlinkState, Breath, BreathParameter, EyeBlink};
pub use expression::{ExpressionBlend, ExpressionClip, ExpressionParameter};
pub use manager::{MotionManager, Priority};
pub use pose::Pose;

use crate::engine::CoreModel;

/// Anything a [`MotionManager`] can play.
pub trait Motion {
    /// Playback length, or `None` for clips that never end on their own.
    fn duration(&self) -> Option<f32>;

    fn is_loop(&self) -> bool;

    fn fade_in_time(&self) -> f32;

    fn fade_out_time(&self) -> f32;

    /// Writes the clip's values at `time` (seconds since start) into `model`.
    fn apply(&self, model: &mut dyn CoreModel, time: f32, weight: f32);
}
