use std::rc::Rc;

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;

use crate::animation::{FinishCallback, Priority};
use crate::assets::{AssetLoader, Completion, join_path};
use crate::audio::AudioPlayer;
use crate::config::{SourceConfig, WidgetConfig};
use crate::engine::ModelEngine;
use crate::events::{EventEmitter, HitArea};
use crate::model::{FrameReport, ModelHandle, ModelInstance, ModelOptions};

pub const MOTION_GROUP_TAP: &str = "Tap";
pub const MOTION_GROUP_TAP_BODY: &str = "TapBody";
pub const MOTION_GROUP_TAP_LEFT: &str = "TapLeft";
pub const MOTION_GROUP_TAP_RIGHT: &str = "TapRight";

/// Owns the scene's models and routes input and fetch completions to them.
///
/// One model is active at a time. Models live in a [`SlotMap`], so a
/// completion addressed to a released model finds no entry and is dropped.
pub struct SceneManager {
    models: SlotMap<ModelHandle, ModelInstance>,
    active: Vec<ModelHandle>,
    view_matrix: Mat4,
    scene_index: usize,
    source: SourceConfig,
    options: ModelOptions,
    engine: Rc<dyn ModelEngine>,
    audio: Option<Rc<dyn AudioPlayer>>,
    rng: StdRng,
    on_motion_finished: FinishCallback,
}

impl SceneManager {
    pub fn new(config: &WidgetConfig, engine: Rc<dyn ModelEngine>, audio: Option<Rc<dyn AudioPlayer>>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let debug = config.debug;
        let on_motion_finished: FinishCallback = Rc::new(move |key: &str| {
            if debug {
                log::debug!("Motion Finished: OK [{key}]");
            }
        });
        Self {
            models: SlotMap::with_key(),
            active: Vec::new(),
            view_matrix: Mat4::IDENTITY,
            scene_index: 0,
            source: config.source.clone(),
            options: ModelOptions::from(config),
            engine,
            audio,
            rng,
            on_motion_finished,
        }
    }

    // ------------------------------------------------------------------
    // Scene switching
    // ------------------------------------------------------------------

    /// Releases the current models and starts loading model `index`
    /// (taken modulo the model list length).
    pub fn change_scene(&mut self, index: usize, loader: &AssetLoader) -> Option<ModelHandle> {
        let count = self.source.models.len();
        if count == 0 {
            log::warn!("No models configured");
            return None;
        }
        self.scene_index = index % count;
        if self.options.debug {
            log::debug!("[APP]model index: {}", self.scene_index);
        }

        let name = self.source.models[self.scene_index].clone();
        let home_dir = join_path(&self.source.path, &name);

        self.release_all();

        let seed = self.rng.random::<u64>();
        let engine = self.engine.clone();
        let audio = self.audio.clone();
        let options = self.options;
        let handle = self
            .models
            .insert_with_key(|handle| ModelInstance::new(handle, home_dir, &name, engine, audio, options, seed));
        self.active.push(handle);
        if let Some(model) = self.models.get_mut(handle) {
            model.load_assets(loader);
        }
        Some(handle)
    }

    pub fn next_scene(&mut self, loader: &AssetLoader) -> Option<ModelHandle> {
        let count = self.source.models.len().max(1);
        self.change_scene((self.scene_index + 1) % count, loader)
    }

    pub fn prev_scene(&mut self, loader: &AssetLoader) -> Option<ModelHandle> {
        let count = self.source.models.len().max(1);
        self.change_scene((self.scene_index + count - 1) % count, loader)
    }

    /// Releases and forgets every model.
    pub fn release_all(&mut self) {
        for handle in self.active.drain(..) {
            if let Some(mut model) = self.models.remove(handle) {
                model.release();
            }
        }
    }

    // ------------------------------------------------------------------
    // Fetch completions
    // ------------------------------------------------------------------

    /// Hands each completion to the model that requested it.
    pub fn dispatch_completions(&mut self, completions: Vec<Completion>, loader: &AssetLoader) {
        for completion in completions {
            let Completion { ticket, path, result } = completion;
            match self.models.get_mut(ticket.model) {
                Some(model) => model.on_asset_loaded(ticket.request, &path, result, loader),
                None => log::debug!("Dropping stale completion for '{path}'"),
            }
        }
    }

    /// Drives ready fetches once and routes their results.
    pub fn pump(&mut self, loader: &mut AssetLoader) {
        let completions = loader.poll();
        self.dispatch_completions(completions, loader);
    }

    /// Blocks until no fetch is outstanding.
    ///
    /// Requires a reader whose reads always resolve.
    pub fn settle(&mut self, loader: &mut AssetLoader) {
        loop {
            let completions = loader.run_to_completion();
            if completions.is_empty() {
                break;
            }
            self.dispatch_completions(completions, loader);
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Forwards view-space drag coordinates to every model.
    pub fn on_drag(&mut self, x: f32, y: f32) {
        for handle in &self.active {
            if let Some(model) = self.models.get_mut(*handle) {
                model.set_dragging(x, y);
            }
        }
    }

    /// Resolves a tap at screen-space `(x, y)`.
    ///
    /// Hit areas are tested in the order Head, Left, Right, Body; the first
    /// hit triggers its reaction and emits its tag. Models that declare no
    /// hit areas react to every tap as `Other`.
    pub fn on_tap(&mut self, x: f32, y: f32, loader: &AssetLoader, emitter: &mut EventEmitter) -> Option<HitArea> {
        let debug = self.options.debug;
        if debug {
            log::debug!("[APP]tap point: {{x: {x:.2} y: {y:.2}}}");
        }
        let on_finished = Some(self.on_motion_finished.clone());

        for handle in &self.active {
            let Some(model) = self.models.get_mut(*handle) else {
                continue;
            };
            let Some(hit_areas) = model.setting().map(|s| s.hit_areas_count()) else {
                continue;
            };

            if hit_areas == 0 {
                log_hit(debug, HitArea::Other);
                model.start_random_motion(MOTION_GROUP_TAP, Priority::Normal, on_finished.clone(), loader);
                emitter.emit(HitArea::Other);
                return Some(HitArea::Other);
            }

            let hit = [HitArea::Head, HitArea::Left, HitArea::Right, HitArea::Body]
                .into_iter()
                .find(|area| model.hit_test(*area, x, y));
            let Some(area) = hit else {
                continue;
            };

            log_hit(debug, area);
            match area {
                HitArea::Head => {
                    model.set_random_expression();
                }
                HitArea::Left => {
                    model.start_random_left_hand_motion(
                        MOTION_GROUP_TAP_LEFT,
                        Priority::Normal,
                        on_finished.clone(),
                        loader,
                    );
                }
                HitArea::Right => {
                    model.start_random_right_hand_motion(
                        MOTION_GROUP_TAP_RIGHT,
                        Priority::Normal,
                        on_finished.clone(),
                        loader,
                    );
                }
                HitArea::Body | HitArea::Other => {
                    model.start_random_motion(MOTION_GROUP_TAP_BODY, Priority::Normal, on_finished.clone(), loader);
                }
            }
            emitter.emit(area);
            return Some(area);
        }
        None
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Updates and draws every model for a `width x height` canvas.
    ///
    /// Returns the report of the current model.
    pub fn on_update(&mut self, width: u32, height: u32, dt: f32, loader: &AssetLoader) -> Option<FrameReport> {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let mut first = None;

        for handle in &self.active {
            let Some(model) = self.models.get_mut(*handle) else {
                continue;
            };

            let mut projection = Mat4::IDENTITY;
            let canvas_width = model.core().map(|core| core.canvas_size().x);
            if let Some(canvas_width) = canvas_width {
                let scale = if canvas_width > 1.0 && w < h {
                    // Wide model in a tall canvas: fit by width.
                    model.model_matrix_mut().set_width(2.0);
                    Vec3::new(1.0, w / h, 1.0)
                } else {
                    Vec3::new(h / w, 1.0, 1.0)
                };
                projection = Mat4::from_scale(scale) * self.view_matrix;
            }

            let report = model.update(dt, loader);
            model.draw(&projection);
            first.get_or_insert(report);
        }
        first
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn set_view_matrix(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[must_use]
    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    #[must_use]
    pub fn model_names(&self) -> &[String] {
        &self.source.models
    }

    /// Handles of the active models.
    #[must_use]
    pub fn active(&self) -> &[ModelHandle] {
        &self.active
    }

    #[must_use]
    pub fn model(&self, handle: ModelHandle) -> Option<&ModelInstance> {
        self.models.get(handle)
    }

    pub fn model_mut(&mut self, handle: ModelHandle) -> Option<&mut ModelInstance> {
        self.models.get_mut(handle)
    }

    #[must_use]
    pub fn current_model(&self) -> Option<&ModelInstance> {
        self.active.first().and_then(|h| self.models.get(*h))
    }

    pub fn current_model_mut(&mut self) -> Option<&mut ModelInstance> {
        let handle = *self.active.first()?;
        self.models.get_mut(handle)
    }

    /// Number of live model instances.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

fn log_hit(debug: bool, area: HitArea) {
    if debug {
        log::debug!("[APP]hit area: [{area}]");
    }
}
