use glam::Vec2;

/// Single-pointer gesture state in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchManager {
    start: Vec2,
    last: Vec2,
    pressed: bool,
    flick_available: bool,
}

impl Default for TouchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Vec2::ZERO,
            last: Vec2::ZERO,
            pressed: false,
            flick_available: false,
        }
    }

    // ========== Events ==========

    pub fn touches_began(&mut self, x: f32, y: f32) {
        self.start = Vec2::new(x, y);
        self.last = self.start;
        self.pressed = true;
        self.flick_available = true;
    }

    pub fn touches_moved(&mut self, x: f32, y: f32) {
        self.last = Vec2::new(x, y);
    }

    pub fn touches_ended(&mut self) {
        self.pressed = false;
    }

    // ========== Queries ==========

    /// Last pointer position.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.last.x
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.last.y
    }

    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.start
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    #[must_use]
    pub fn is_flick_available(&self) -> bool {
        self.flick_available
    }

    pub fn disable_flick(&mut self) {
        self.flick_available = false;
    }

    /// Distance from the touch start to the last position.
    #[must_use]
    pub fn flick_distance(&self) -> f32 {
        self.start.distance(self.last)
    }
}

/// The smaller of two movements when they point the same way, otherwise 0.
#[must_use]
pub fn moving_amount(v1: f32, v2: f32) -> f32 {
    if (v1 > 0.0) != (v2 > 0.0) {
        return 0.0;
    }
    let sign = if v1 > 0.0 { 1.0 } else { -1.0 };
    sign * v1.abs().min(v2.abs())
}
