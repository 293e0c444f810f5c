use glam::Vec2;

const FRAME_RATE: f32 = 30.0;
const EPSILON: f32 = 0.01;

/// Smoothly follows a drag target with bounded acceleration.
///
/// The face turns towards the pointer at most `4 / 30` units per reference
/// frame, reaching that speed in 0.15 s and decelerating before arriving.
#[derive(Debug, Clone, Default)]
pub struct TargetPoint {
    target: Vec2,
    face: Vec2,
    velocity: Vec2,
    user_time: f32,
    last_time: f32,
}

impl TargetPoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the point to follow, in `[-1, 1]` on both axes.
    pub fn set(&mut self, x: f32, y: f32) {
        self.target = Vec2::new(x, y);
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.face.x
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.face.y
    }

    pub fn update(&mut self, dt: f32) {
        self.user_time += dt;

        let face_param_max_v = 40.0 / 10.0;
        let max_v = face_param_max_v / FRAME_RATE;

        if self.last_time == 0.0 {
            self.last_time = self.user_time;
            return;
        }

        let delta_time_weight = (self.user_time - self.last_time) * FRAME_RATE;
        self.last_time = self.user_time;

        let time_to_max_speed = 0.15;
        let frame_to_max_speed = time_to_max_speed * FRAME_RATE;
        let max_a = delta_time_weight * max_v / frame_to_max_speed;

        let d = self.target - self.face;
        if d.x.abs() <= EPSILON && d.y.abs() <= EPSILON {
            return;
        }

        let distance = d.length();
        let target_v = d * (max_v * delta_time_weight / distance);

        let mut dv = target_v - self.velocity;
        let dv_len = dv.length();
        if dv_len > max_a {
            dv *= max_a / dv_len;
        }
        self.velocity += dv;

        // Brake so the follower does not overshoot the target.
        let braking_max = 0.5 * ((max_a * max_a + 16.0 * max_a * distance - 8.0 * max_a * distance).sqrt() - max_a);
        let speed = self.velocity.length();
        if speed > braking_max {
            self.velocity *= braking_max / speed;
        }

        self.face += self.velocity;
    }
}
