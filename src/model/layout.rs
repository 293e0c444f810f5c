use glam::{Mat4, Vec3};

/// Places a model's canvas in view space.
///
/// Scaling is always uniform: setting the width or height rescales both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMatrix {
    width: f32,
    height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl ModelMatrix {
    /// A matrix for a canvas of `width x height` model units, scaled to a
    /// view height of 2.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        let mut matrix = Self {
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        };
        matrix.set_height(2.0);
        matrix
    }

    pub fn set_width(&mut self, w: f32) {
        if self.width > 0.0 {
            let s = w / self.width;
            self.scale(s, s);
        }
    }

    pub fn set_height(&mut self, h: f32) {
        if self.height > 0.0 {
            let s = h / self.height;
            self.scale(s, s);
        }
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.scale_x = x;
        self.scale_y = y;
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.translate_x = x;
        self.translate_y = y;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.translate(x, y);
    }

    pub fn set_center_position(&mut self, x: f32, y: f32) {
        self.center_x(x);
        self.center_y(y);
    }

    pub fn center_x(&mut self, x: f32) {
        self.translate_x = x - self.width * self.scale_x / 2.0;
    }

    pub fn center_y(&mut self, y: f32) {
        self.translate_y = y - self.height * self.scale_y / 2.0;
    }

    pub fn top(&mut self, y: f32) {
        self.translate_y = y;
    }

    pub fn bottom(&mut self, y: f32) {
        self.translate_y = y - self.height * self.scale_y;
    }

    pub fn left(&mut self, x: f32) {
        self.translate_x = x;
    }

    pub fn right(&mut self, x: f32) {
        self.translate_x = x - self.width * self.scale_x;
    }

    /// Applies manifest layout entries (snake-case keys).
    ///
    /// Size keys go first so position keys see the final scale.
    pub fn setup_from_layout(&mut self, layout: &[(String, f32)]) {
        for (key, value) in layout {
            match key.as_str() {
                "width" => self.set_width(*value),
                "height" => self.set_height(*value),
                _ => {}
            }
        }
        for (key, value) in layout {
            match key.as_str() {
                "x" => self.translate_x = *value,
                "y" => self.translate_y = *value,
                "center_x" => self.center_x(*value),
                "center_y" => self.center_y(*value),
                "top" => self.top(*value),
                "bottom" => self.bottom(*value),
                "left" => self.left(*value),
                "right" => self.right(*value),
                "width" | "height" => {}
                other => log::debug!("Ignoring unknown layout key '{other}'"),
            }
        }
    }

    #[must_use]
    pub fn invert_transform_x(&self, x: f32) -> f32 {
        (x - self.translate_x) / self.scale_x
    }

    #[must_use]
    pub fn invert_transform_y(&self, y: f32) -> f32 {
        (y - self.translate_y) / self.scale_y
    }

    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.translate_x, self.translate_y, 0.0))
            * Mat4::from_scale(Vec3::new(self.scale_x, self.scale_y, 1.0))
    }
}
