//! Per-frame animation compositor.
//!
//! Layer order is fixed; later layers add onto earlier ones:
//!
//! 1. restore the saved parameters
//! 2. motions (or the idle fallback when the primary layer is empty)
//! 3. save the parameters
//! 4. eye blink, only when no motion wrote anything
//! 5. expression
//! 6. drag (head, body, eyes)
//! 7. breath
//! 8. physics
//! 9. lip-sync
//! 10. pose
//! 11. commit

use crate::animation::Priority;
use crate::animation::effects::{
    PARAM_ANGLE_X, PARAM_ANGLE_Y, PARAM_ANGLE_Z, PARAM_BODY_ANGLE_X, PARAM_EYE_BALL_X, PARAM_EYE_BALL_Y,
};
use crate::assets::AssetLoader;
use crate::model::{LoadStage, ModelInstance};

pub const MOTION_GROUP_IDLE: &str = "Idle";

const LIP_SYNC_WEIGHT: f32 = 0.8;

/// What one [`ModelInstance::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Whether the compositor ran at all (the model is loaded).
    pub composed: bool,
    /// Whether any motion layer wrote parameters.
    pub motion_updated: bool,
    pub blink_applied: bool,
    /// Whether the primary layer was empty and an idle motion was requested.
    pub idle_started: bool,
    /// Lip-sync value pushed this frame, when lip-sync is enabled.
    pub lip_sync_value: Option<f32>,
}

impl ModelInstance {
    /// Advances the model by `dt` seconds.
    ///
    /// Before loading completes this only counts the current stage's wait
    /// time against the timeout.
    pub fn update(&mut self, dt: f32, loader: &AssetLoader) -> FrameReport {
        if self.stage != LoadStage::CompleteSetup {
            self.tick_load_timeout(dt);
            return FrameReport::default();
        }
        if self.core.is_none() {
            return FrameReport::default();
        }

        let mut report = FrameReport {
            composed: true,
            ..FrameReport::default()
        };
        self.user_time += dt;

        self.drag.update(dt);
        let drag_x = self.drag.x();
        let drag_y = self.drag.y();

        if let Some(core) = self.core.as_deref_mut() {
            core.load_parameters();
        }

        if self.motion_manager.is_finished() {
            self.start_random_motion(MOTION_GROUP_IDLE, Priority::Idle, None, loader);
            report.idle_started = true;
        } else if let Some(core) = self.core.as_deref_mut() {
            let primary = self.motion_manager.update_motion(core, dt, &self.motions);
            let right = self.right_arm_manager.update_motion(core, dt, &self.motions);
            let left = self.left_arm_manager.update_motion(core, dt, &self.motions);
            report.motion_updated = primary || right || left;
        }

        let Some(core) = self.core.as_deref_mut() else {
            return report;
        };
        core.save_parameters();

        if !report.motion_updated {
            if let Some(eye_blink) = &mut self.eye_blink {
                eye_blink.update_parameters(core, dt);
                report.blink_applied = true;
            }
        }

        self.expression_manager.update_motion(core, dt, &self.expressions);

        core.add_parameter_value(PARAM_ANGLE_X, drag_x * 30.0, 1.0);
        core.add_parameter_value(PARAM_ANGLE_Y, drag_y * 30.0, 1.0);
        core.add_parameter_value(PARAM_ANGLE_Z, drag_x * drag_y * -30.0, 1.0);
        core.add_parameter_value(PARAM_BODY_ANGLE_X, drag_x * 10.0, 1.0);
        core.add_parameter_value(PARAM_EYE_BALL_X, drag_x, 1.0);
        core.add_parameter_value(PARAM_EYE_BALL_Y, drag_y, 1.0);

        if let Some(breath) = &mut self.breath {
            breath.update_parameters(core, dt);
        }

        if let Some(physics) = &mut self.physics {
            physics.evaluate(core, dt);
        }

        if self.options.lip_sync {
            self.wav.update(dt);
            let value = self.wav.rms();
            for id in &self.lip_sync_ids {
                core.add_parameter_value(id, value, LIP_SYNC_WEIGHT);
            }
            report.lip_sync_value = Some(value);
        }

        if let Some(pose) = &mut self.pose {
            pose.update_parameters(core, dt);
        }

        core.update();
        report
    }
}
