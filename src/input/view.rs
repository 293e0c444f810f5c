use glam::{Mat4, Vec3};

use crate::config::{
    VIEW_LOGICAL_BOTTOM, VIEW_LOGICAL_MAX_BOTTOM, VIEW_LOGICAL_MAX_LEFT, VIEW_LOGICAL_MAX_RIGHT, VIEW_LOGICAL_MAX_TOP,
    VIEW_LOGICAL_TOP, VIEW_SCALE_MAX, VIEW_SCALE_MIN,
};

/// Maps device pixels to logical screen space and applies the view zoom/pan.
///
/// Logical screen space spans `[-1, 1]` vertically and `[-w/h, w/h]`
/// horizontally, y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    width: f32,
    height: f32,
    device_scale: f32,

    screen_left: f32,
    screen_right: f32,
    screen_bottom: f32,
    screen_top: f32,

    scale_x: f32,
    scale_y: f32,
    translate_x: f32,
    translate_y: f32,
}

impl ViewTransform {
    /// Sets up the transform for a `width x height` canvas with initial zoom `scale`.
    #[must_use]
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let ratio = w / h;
        let (left, right) = (-ratio, ratio);
        let (bottom, top) = (VIEW_LOGICAL_BOTTOM, VIEW_LOGICAL_TOP);

        let device_scale = if w > h {
            (right - left).abs() / w
        } else {
            (top - bottom).abs() / h
        };

        Self {
            width: w,
            height: h,
            device_scale,
            screen_left: left,
            screen_right: right,
            screen_bottom: bottom,
            screen_top: top,
            scale_x: scale,
            scale_y: scale,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }

    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    // ========== Device -> screen ==========

    #[must_use]
    pub fn device_to_screen_x(&self, device_x: f32) -> f32 {
        (device_x - self.width * 0.5) * self.device_scale
    }

    #[must_use]
    pub fn device_to_screen_y(&self, device_y: f32) -> f32 {
        -(device_y - self.height * 0.5) * self.device_scale
    }

    // ========== Device -> view ==========

    #[must_use]
    pub fn transform_view_x(&self, device_x: f32) -> f32 {
        self.invert_x(self.device_to_screen_x(device_x))
    }

    #[must_use]
    pub fn transform_view_y(&self, device_y: f32) -> f32 {
        self.invert_y(self.device_to_screen_y(device_y))
    }

    #[must_use]
    pub fn invert_x(&self, screen_x: f32) -> f32 {
        (screen_x - self.translate_x) / self.scale_x
    }

    #[must_use]
    pub fn invert_y(&self, screen_y: f32) -> f32 {
        (screen_y - self.translate_y) / self.scale_y
    }

    // ========== Zoom and pan ==========

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale_x
    }

    /// Zooms by `factor` around screen point `(cx, cy)`, keeping the result
    /// within the zoom limits.
    pub fn adjust_scale(&mut self, cx: f32, cy: f32, factor: f32) {
        let mut factor = factor;
        let target = factor * self.scale_x;
        if self.scale_x > 0.0 {
            if target < VIEW_SCALE_MIN {
                factor = VIEW_SCALE_MIN / self.scale_x;
            } else if target > VIEW_SCALE_MAX {
                factor = VIEW_SCALE_MAX / self.scale_x;
            }
        }
        self.scale_x *= factor;
        self.scale_y *= factor;
        self.translate_x = cx + factor * (self.translate_x - cx);
        self.translate_y = cy + factor * (self.translate_y - cy);
    }

    /// Pans by `(x, y)`, stopping where the maximum logical rectangle would
    /// leave the screen.
    pub fn adjust_translate(&mut self, x: f32, y: f32) {
        let mut x = x;
        let mut y = y;
        if self.scale_x * VIEW_LOGICAL_MAX_LEFT + self.translate_x + x > self.screen_left {
            x = self.screen_left - self.scale_x * VIEW_LOGICAL_MAX_LEFT - self.translate_x;
        }
        if self.scale_x * VIEW_LOGICAL_MAX_RIGHT + self.translate_x + x < self.screen_right {
            x = self.screen_right - self.scale_x * VIEW_LOGICAL_MAX_RIGHT - self.translate_x;
        }
        if self.scale_y * VIEW_LOGICAL_MAX_TOP + self.translate_y + y < self.screen_top {
            y = self.screen_top - self.scale_y * VIEW_LOGICAL_MAX_TOP - self.translate_y;
        }
        if self.scale_y * VIEW_LOGICAL_MAX_BOTTOM + self.translate_y + y > self.screen_bottom {
            y = self.screen_bottom - self.scale_y * VIEW_LOGICAL_MAX_BOTTOM - self.translate_y;
        }
        self.translate_x += x;
        self.translate_y += y;
    }

    #[must_use]
    pub fn is_max_scale(&self) -> bool {
        self.scale_x >= VIEW_SCALE_MAX
    }

    #[must_use]
    pub fn is_min_scale(&self) -> bool {
        self.scale_x <= VIEW_SCALE_MIN
    }

    /// The view matrix handed to the scene.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.translate_x, self.translate_y, 0.0))
            * Mat4::from_scale(Vec3::new(self.scale_x, self.scale_y, 1.0))
    }
}
