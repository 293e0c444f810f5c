//! Animation Engine Seams
//!
//! The widget drives a third-party model runtime it does not implement. This
//! module declares the narrow surface it needs from that runtime:
//!
//! - [`ModelEngine`]: global bootstrap plus factories for models, physics
//!   rigs and renderers
//! - [`CoreModel`]: a live model's parameter buffer, part opacities and
//!   drawable hit testing
//! - [`PhysicsRig`]: per-frame physics evaluation
//! - [`ModelRenderer`] / [`RenderSurface`]: texture binding and drawing
//!
//! [`ParameterModel`] is a self-contained [`CoreModel`] that engine adapters
//! can wrap, and that tests use directly.

pub mod parameters;

pub use parameters::ParameterModel;

use glam::{Mat4, Vec2};

use crate::assets::TextureImage;
use crate::config::CanvasMode;
use crate::errors::Result;

/// Process-wide animation runtime.
///
/// Methods take `&self`; implementations keep their mutable state behind
/// interior mutability since the engine is shared by every model.
pub trait ModelEngine {
    fn is_started(&self) -> bool;

    /// Boots the runtime from its bootstrap script/library bytes.
    fn start_up(&self, bootstrap: &[u8]) -> Result<()>;

    /// Tears down global runtime state.
    fn dispose(&self);

    fn load_model(&self, moc: &[u8]) -> Result<Box<dyn CoreModel>>;

    fn load_physics(&self, physics: &[u8]) -> Result<Box<dyn PhysicsRig>>;

    fn create_renderer(&self) -> Box<dyn ModelRenderer>;
}

/// A live model instance.
pub trait CoreModel {
    /// Current value of a parameter; unknown ids read as 0.
    fn parameter_value(&self, id: &str) -> f32;

    /// Blends `value` into the parameter: `current * (1 - weight) + value * weight`.
    fn set_parameter_value(&mut self, id: &str, value: f32, weight: f32);

    /// `current + value * weight`.
    fn add_parameter_value(&mut self, id: &str, value: f32, weight: f32) {
        let current = self.parameter_value(id);
        self.set_parameter_value(id, current + value * weight, 1.0);
    }

    /// `current * (1 + (value - 1) * weight)`.
    fn multiply_parameter_value(&mut self, id: &str, value: f32, weight: f32) {
        let current = self.parameter_value(id);
        self.set_parameter_value(id, current * (1.0 + (value - 1.0) * weight), 1.0);
    }

    fn part_opacity(&self, id: &str) -> f32;

    fn set_part_opacity(&mut self, id: &str, opacity: f32);

    /// Snapshots the parameter buffer.
    fn save_parameters(&mut self);

    /// Restores the last snapshot.
    fn load_parameters(&mut self);

    /// Commits the composed parameters into the model's deformed state.
    fn update(&mut self);

    /// Whether model-space point `(x, y)` lies inside the drawable's bounds.
    fn is_hit(&self, drawable: &str, x: f32, y: f32) -> bool;

    /// Canvas size in model units.
    fn canvas_size(&self) -> Vec2;
}

pub trait PhysicsRig {
    fn evaluate(&mut self, model: &mut dyn CoreModel, dt: f32);
}

pub trait ModelRenderer {
    fn bind_texture(&mut self, slot: usize, image: &TextureImage);

    fn set_premultiplied_alpha(&mut self, enabled: bool);

    fn draw(&mut self, model: &dyn CoreModel, mvp: &Mat4);
}

/// The drawing surface (canvas + graphics context).
pub trait RenderSurface {
    /// Acquires the context. Failure is fatal to widget initialisation.
    fn initialize(&mut self, canvas: CanvasMode) -> Result<(u32, u32)>;

    /// Re-measures an auto-sized surface and returns the new size.
    fn resize(&mut self) -> (u32, u32);

    fn size(&self) -> (u32, u32);

    /// Clears the frame before models draw.
    fn begin_frame(&mut self);

    fn release(&mut self);
}
