use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::engine::CoreModel;

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f32,
    max: f32,
}

/// Axis-aligned drawable bounds in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl DrawableRect {
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

/// In-memory parameter buffer implementing [`CoreModel`].
///
/// Unknown parameters are created on first write. Parameters declared with
/// [`ParameterModel::with_parameter`] are clamped to their range.
#[derive(Debug, Clone)]
pub struct ParameterModel {
    values: FxHashMap<String, f32>,
    defaults: FxHashMap<String, f32>,
    ranges: FxHashMap<String, Range>,
    saved: FxHashMap<String, f32>,
    parts: FxHashMap<String, f32>,
    drawables: FxHashMap<String, DrawableRect>,
    canvas: Vec2,
    commits: u64,
}

impl Default for ParameterModel {
    fn default() -> Self {
        Self::new(Vec2::new(1.0, 1.0))
    }
}

impl ParameterModel {
    #[must_use]
    pub fn new(canvas: Vec2) -> Self {
        Self {
            values: FxHashMap::default(),
            defaults: FxHashMap::default(),
            ranges: FxHashMap::default(),
            saved: FxHashMap::default(),
            parts: FxHashMap::default(),
            drawables: FxHashMap::default(),
            canvas,
            commits: 0,
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, id: &str, min: f32, max: f32, default: f32) -> Self {
        self.ranges.insert(id.to_string(), Range { min, max });
        self.defaults.insert(id.to_string(), default);
        self.values.insert(id.to_string(), default);
        self
    }

    #[must_use]
    pub fn with_part(mut self, id: &str, opacity: f32) -> Self {
        self.parts.insert(id.to_string(), opacity);
        self
    }

    #[must_use]
    pub fn with_drawable(mut self, id: &str, rect: DrawableRect) -> Self {
        self.drawables.insert(id.to_string(), rect);
        self
    }

    /// Number of [`CoreModel::update`] calls so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Resets every parameter to its declared default (or 0).
    pub fn reset(&mut self) {
        for (id, value) in &mut self.values {
            *value = self.defaults.get(id).copied().unwrap_or(0.0);
        }
    }

    fn clamp(&self, id: &str, value: f32) -> f32 {
        match self.ranges.get(id) {
            Some(range) => value.clamp(range.min, range.max),
            None => value,
        }
    }
}

impl CoreModel for ParameterModel {
    fn parameter_value(&self, id: &str) -> f32 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    fn set_parameter_value(&mut self, id: &str, value: f32, weight: f32) {
        let current = self.parameter_value(id);
        let blended = if weight >= 1.0 {
            value
        } else {
            current * (1.0 - weight) + value * weight
        };
        let clamped = self.clamp(id, blended);
        self.values.insert(id.to_string(), clamped);
    }

    fn part_opacity(&self, id: &str) -> f32 {
        self.parts.get(id).copied().unwrap_or(1.0)
    }

    fn set_part_opacity(&mut self, id: &str, opacity: f32) {
        self.parts.insert(id.to_string(), opacity);
    }

    fn save_parameters(&mut self) {
        self.saved.clone_from(&self.values);
    }

    /// Parameters created after the snapshot fall back to their default.
    fn load_parameters(&mut self) {
        for (id, value) in &mut self.values {
            *value = self
                .saved
                .get(id)
                .or_else(|| self.defaults.get(id))
                .copied()
                .unwrap_or(0.0);
        }
    }

    fn update(&mut self) {
        self.commits += 1;
    }

    fn is_hit(&self, drawable: &str, x: f32, y: f32) -> bool {
        self.drawables
            .get(drawable)
            .is_some_and(|rect| rect.contains(x, y))
    }

    fn canvas_size(&self) -> Vec2 {
        self.canvas
    }
}
