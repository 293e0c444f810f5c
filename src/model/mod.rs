//! Model Module
//!
//! One [`ModelInstance`] per loaded character:
//!
//! - [`setting`]: the parsed model3.json manifest and userdata3.json
//! - [`load`]: the asynchronous load state machine
//! - [`update`]: the per-frame animation compositor
//! - [`layout`]: the model matrix placing the canvas in view space
//!
//! Instances are addressed by generational [`ModelHandle`]s so that fetch
//! completions for a released model can be recognised and dropped.

pub mod layout;
pub mod load;
pub mod setting;
pub mod update;

pub use layout::ModelMatrix;
pub use load::{LoadProgress, LoadStage, LoadStatus, motion_key};
pub use setting::{ModelSetting, UserData, UserDataEntry};
pub use update::FrameReport;

use std::rc::Rc;

use glam::Mat4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::new_key_type;

use crate::animation::{
    Breath, ClipSlot, ExpressionClip, EyeBlink, FinishCallback, MotionClip, MotionHandle, MotionManager, Pose,
    Priority, TargetPoint,
};
use crate::assets::{AssetLoader, AssetRequest, ClipCache, ClipStatus, FetchTicket, join_path};
use crate::audio::{AudioPlayer, WavFileHandler};
use crate::config::WidgetConfig;
use crate::engine::{CoreModel, ModelEngine, ModelRenderer, PhysicsRig};
use crate::errors::{Result, WidgetError};
use crate::events::HitArea;

new_key_type! {
    /// Identity of a model instance inside the scene.
    pub struct ModelHandle;
}

/// Per-model options taken from the widget config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    pub debug: bool,
    pub lip_sync: bool,
    pub stage_timeout_secs: f32,
}

impl From<&WidgetConfig> for ModelOptions {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            debug: config.debug,
            lip_sync: config.lip_sync,
            stage_timeout_secs: config.stage_timeout_secs,
        }
    }
}

/// Which motion layer a motion is started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionLayer {
    Primary,
    LeftArm,
    RightArm,
}

/// A loaded (or loading) character.
pub struct ModelInstance {
    handle: ModelHandle,
    home_dir: String,
    manifest_file: String,
    engine: Rc<dyn ModelEngine>,
    options: ModelOptions,
    rng: StdRng,

    // Load state
    setting: Option<Rc<ModelSetting>>,
    stage: LoadStage,
    trail: Vec<LoadStage>,
    stage_elapsed: f32,
    progress: LoadProgress,
    load_error: Option<WidgetError>,

    // Engine objects
    core: Option<Box<dyn CoreModel>>,
    physics: Option<Box<dyn PhysicsRig>>,
    renderer: Option<Box<dyn ModelRenderer>>,
    pose: Option<Pose>,
    user_data: Option<UserData>,
    eye_blink: Option<EyeBlink>,
    breath: Option<Breath>,
    eye_blink_ids: Vec<String>,
    lip_sync_ids: Vec<String>,
    model_matrix: ModelMatrix,

    // Clips and their players
    motions: ClipCache<MotionClip>,
    expressions: ClipCache<ExpressionClip>,
    motion_manager: MotionManager<MotionClip>,
    left_arm_manager: MotionManager<MotionClip>,
    right_arm_manager: MotionManager<MotionClip>,
    expression_manager: MotionManager<ExpressionClip>,

    drag: TargetPoint,
    wav: WavFileHandler,
    user_time: f32,
    opacity: f32,
}

impl ModelInstance {
    /// Creates an unloaded model for `<home_dir>/<name>.model3.json`.
    pub fn new(
        handle: ModelHandle,
        home_dir: impl Into<String>,
        name: &str,
        engine: Rc<dyn ModelEngine>,
        audio: Option<Rc<dyn AudioPlayer>>,
        options: ModelOptions,
        seed: u64,
    ) -> Self {
        Self {
            handle,
            home_dir: home_dir.into(),
            manifest_file: format!("{name}.model3.json"),
            engine,
            options,
            rng: StdRng::seed_from_u64(seed),
            setting: None,
            stage: LoadStage::LoadAssets,
            trail: Vec::new(),
            stage_elapsed: 0.0,
            progress: LoadProgress::default(),
            load_error: None,
            core: None,
            physics: None,
            renderer: None,
            pose: None,
            user_data: None,
            eye_blink: None,
            breath: None,
            eye_blink_ids: Vec::new(),
            lip_sync_ids: Vec::new(),
            model_matrix: ModelMatrix::new(2.0, 2.0),
            motions: ClipCache::new(),
            expressions: ClipCache::new(),
            motion_manager: MotionManager::new(),
            left_arm_manager: MotionManager::new(),
            right_arm_manager: MotionManager::new(),
            expression_manager: MotionManager::new(),
            drag: TargetPoint::new(),
            wav: WavFileHandler::new(audio),
            user_time: 0.0,
            opacity: 1.0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn handle(&self) -> ModelHandle {
        self.handle
    }

    #[must_use]
    pub fn home_dir(&self) -> &str {
        &self.home_dir
    }

    #[must_use]
    pub fn setting(&self) -> Option<&ModelSetting> {
        self.setting.as_deref()
    }

    #[must_use]
    pub fn core(&self) -> Option<&dyn CoreModel> {
        self.core.as_deref()
    }

    pub fn core_mut(&mut self) -> Option<&mut (dyn CoreModel + 'static)> {
        self.core.as_deref_mut()
    }

    #[must_use]
    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    #[must_use]
    pub fn has_physics(&self) -> bool {
        self.physics.is_some()
    }

    #[must_use]
    pub fn has_pose(&self) -> bool {
        self.pose.is_some()
    }

    #[must_use]
    pub fn has_eye_blink(&self) -> bool {
        self.eye_blink.is_some()
    }

    #[must_use]
    pub fn eye_blink_ids(&self) -> &[String] {
        &self.eye_blink_ids
    }

    #[must_use]
    pub fn lip_sync_ids(&self) -> &[String] {
        &self.lip_sync_ids
    }

    #[must_use]
    pub fn model_matrix(&self) -> &ModelMatrix {
        &self.model_matrix
    }

    pub fn model_matrix_mut(&mut self) -> &mut ModelMatrix {
        &mut self.model_matrix
    }

    #[must_use]
    pub fn motions(&self) -> &ClipCache<MotionClip> {
        &self.motions
    }

    #[must_use]
    pub fn expressions(&self) -> &ClipCache<ExpressionClip> {
        &self.expressions
    }

    #[must_use]
    pub fn motion_manager(&self, layer: MotionLayer) -> &MotionManager<MotionClip> {
        match layer {
            MotionLayer::Primary => &self.motion_manager,
            MotionLayer::LeftArm => &self.left_arm_manager,
            MotionLayer::RightArm => &self.right_arm_manager,
        }
    }

    pub fn motion_manager_mut(&mut self, layer: MotionLayer) -> &mut MotionManager<MotionClip> {
        match layer {
            MotionLayer::Primary => &mut self.motion_manager,
            MotionLayer::LeftArm => &mut self.left_arm_manager,
            MotionLayer::RightArm => &mut self.right_arm_manager,
        }
    }

    #[must_use]
    pub fn expression_manager(&self) -> &MotionManager<ExpressionClip> {
        &self.expression_manager
    }

    #[must_use]
    pub fn wav(&self) -> &WavFileHandler {
        &self.wav
    }

    pub fn wav_mut(&mut self) -> &mut WavFileHandler {
        &mut self.wav
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn user_time(&self) -> f32 {
        self.user_time
    }

    /// Smoothed drag offsets currently applied to the head and body.
    #[must_use]
    pub fn drag_offset(&self) -> (f32, f32) {
        (self.drag.x(), self.drag.y())
    }

    /// Sets the point the face follows, both axes in `[-1, 1]`.
    pub fn set_dragging(&mut self, x: f32, y: f32) {
        self.drag.set(x, y);
    }

    // ------------------------------------------------------------------
    // Motions
    // ------------------------------------------------------------------

    /// Looks a clip up in the motion cache, fetching it lazily on a miss.
    ///
    /// A lazily fetched clip comes back as [`ClipSlot::Pending`] and starts
    /// playing once its bytes arrive. The flag reports whether the clip was
    /// missing from the cache. A clip whose fetch is already in flight is not
    /// fetched again. Returns `None` for clips the manifest does not declare.
    pub fn get_motion(
        &mut self,
        group: &str,
        index: usize,
        loader: &AssetLoader,
    ) -> Option<(ClipSlot<MotionClip>, bool)> {
        let key = motion_key(group, index);
        if let Some(clip) = self.motions.get(&key) {
            return Some((ClipSlot::Ready(clip), false));
        }
        if !self.declares_motion(group, index) {
            return None;
        }

        if self.motions.mark_pending(&key) {
            let file = self
                .setting
                .as_ref()
                .map(|s| s.motion_file_name(group, index).to_string())
                .unwrap_or_default();
            if self.options.debug {
                log::debug!("[APP]fetch motion on demand: {file} => [{key}]");
            }
            loader.fetch(
                FetchTicket {
                    model: self.handle,
                    request: AssetRequest::Motion {
                        group: group.to_string(),
                        index,
                        preload: false,
                    },
                },
                join_path(&self.home_dir, &file),
            );
        }
        Some((ClipSlot::Pending(key), true))
    }

    fn declares_motion(&self, group: &str, index: usize) -> bool {
        self.setting.as_ref().is_some_and(|s| index < s.motion_count(group))
    }

    /// Starts `group[index]` on the primary layer.
    ///
    /// Returns `None` when the priority is refused.
    pub fn start_motion(
        &mut self,
        group: &str,
        index: usize,
        priority: Priority,
        on_finished: Option<FinishCallback>,
        loader: &AssetLoader,
    ) -> Option<MotionHandle> {
        self.start_layer_motion(MotionLayer::Primary, group, index, priority, on_finished, loader)
    }

    /// Starts `group[index]` on `layer`.
    ///
    /// `Force` always takes the slot; lower priorities are refused while an
    /// equal or higher one is reserved or playing.
    pub fn start_layer_motion(
        &mut self,
        layer: MotionLayer,
        group: &str,
        index: usize,
        priority: Priority,
        on_finished: Option<FinishCallback>,
        loader: &AssetLoader,
    ) -> Option<MotionHandle> {
        let debug = self.options.debug;
        if !self.declares_motion(group, index) {
            if debug {
                log::debug!("[APP]motion {group}[{index}] is not declared");
            }
            return None;
        }
        let manager = self.motion_manager_mut(layer);
        if priority == Priority::Force {
            manager.set_reserve_priority(priority);
        } else if !manager.reserve_motion(priority) {
            if debug {
                log::debug!("[APP]can't start motion.");
            }
            return None;
        }

        let (clip, auto_delete) = self.get_motion(group, index, loader)?;

        let voice = self
            .setting
            .as_ref()
            .map(|s| s.motion_sound_file_name(group, index).to_string())
            .unwrap_or_default();
        if !voice.is_empty() {
            let path = join_path(&self.home_dir, &voice);
            self.wav.start(&path, self.handle, loader);
        }

        let key = motion_key(group, index);
        if debug {
            log::debug!("[APP]start motion: [{key}]");
        }
        Some(
            self.motion_manager_mut(layer)
                .start_motion_priority(clip, key, auto_delete, priority, on_finished),
        )
    }

    /// Picks a random clip of `group` and starts it on the primary layer.
    pub fn start_random_motion(
        &mut self,
        group: &str,
        priority: Priority,
        on_finished: Option<FinishCallback>,
        loader: &AssetLoader,
    ) -> Option<MotionHandle> {
        self.start_random_layer_motion(MotionLayer::Primary, group, priority, on_finished, loader)
    }

    pub fn start_random_left_hand_motion(
        &mut self,
        group: &str,
        priority: Priority,
        on_finished: Option<FinishCallback>,
        loader: &AssetLoader,
    ) -> Option<MotionHandle> {
        self.start_random_layer_motion(MotionLayer::LeftArm, group, priority, on_finished, loader)
    }

    pub fn start_random_right_hand_motion(
        &mut self,
        group: &str,
        priority: Priority,
        on_finished: Option<FinishCallback>,
        loader: &AssetLoader,
    ) -> Option<MotionHandle> {
        self.start_random_layer_motion(MotionLayer::RightArm, group, priority, on_finished, loader)
    }

    fn start_random_layer_motion(
        &mut self,
        layer: MotionLayer,
        group: &str,
        priority: Priority,
        on_finished: Option<FinishCallback>,
        loader: &AssetLoader,
    ) -> Option<MotionHandle> {
        let count = self.setting.as_ref().map_or(0, |s| s.motion_count(group));
        if count == 0 {
            return None;
        }
        let index = self.rng.random_range(0..count);
        self.start_layer_motion(layer, group, index, priority, on_finished, loader)
    }

    /// Whether the motion behind `handle` has finished on every layer.
    #[must_use]
    pub fn is_motion_finished(&self, handle: MotionHandle) -> bool {
        self.motion_manager.is_handle_finished(handle)
            && self.left_arm_manager.is_handle_finished(handle)
            && self.right_arm_manager.is_handle_finished(handle)
    }

    fn on_lazy_motion_loaded(&mut self, group: &str, index: usize, path: &str, result: Result<Vec<u8>>) {
        let key = motion_key(group, index);
        match result.and_then(|bytes| self.prepare_motion(group, index, &bytes)) {
            Ok(clip) => {
                self.motions.insert(key, clip);
            }
            Err(err) => {
                log::warn!("Motion '{key}' from '{path}' unavailable: {err}");
                self.motions.mark_failed(&key);
            }
        }
    }

    fn on_voice_loaded(&mut self, generation: u64, path: &str, result: Result<Vec<u8>>) {
        let outcome = result.and_then(|bytes| self.wav.on_loaded(generation, &bytes).map_err(WidgetError::from));
        if let Err(err) = outcome {
            log::warn!("Voice '{path}' not analysed for lip-sync: {err}");
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Plays the expression called `name`. Unknown names are ignored.
    pub fn set_expression(&mut self, name: &str) -> Option<MotionHandle> {
        if self.options.debug {
            log::debug!("[APP]expression: [{name}]");
        }
        match self.expressions.status(name) {
            ClipStatus::Ready => {
                let clip = self.expressions.get(name)?;
                Some(self.expression_manager.start_motion_priority(
                    ClipSlot::Ready(clip),
                    name,
                    false,
                    Priority::Force,
                    None,
                ))
            }
            _ => {
                if self.options.debug {
                    log::debug!("[APP]expression[{name}] is null");
                }
                None
            }
        }
    }

    /// Plays a uniformly chosen loaded expression.
    pub fn set_random_expression(&mut self) -> Option<MotionHandle> {
        if self.expressions.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.expressions.len());
        let name = self.expressions.key_at(index)?.to_string();
        self.set_expression(&name)
    }

    // ------------------------------------------------------------------
    // Hit testing and drawing
    // ------------------------------------------------------------------

    /// Tests view-space point `(x, y)` against the hit area named by `area`.
    ///
    /// Models that are not fully opaque never report hits.
    #[must_use]
    pub fn hit_test(&self, area: HitArea, x: f32, y: f32) -> bool {
        if self.opacity < 1.0 {
            return false;
        }
        let (Some(setting), Some(core)) = (self.setting.as_deref(), self.core.as_deref()) else {
            return false;
        };
        let Some(drawable) = setting.hit_area_id_by_name(area.as_str()) else {
            return false;
        };
        let tx = self.model_matrix.invert_transform_x(x);
        let ty = self.model_matrix.invert_transform_y(y);
        core.is_hit(drawable, tx, ty)
    }

    /// Draws the model with `projection` (view-projection) applied after the
    /// model matrix. No-op until loading has completed.
    pub fn draw(&mut self, projection: &Mat4) {
        if self.stage != LoadStage::CompleteSetup {
            return;
        }
        let (Some(core), Some(renderer)) = (self.core.as_deref(), self.renderer.as_mut()) else {
            return;
        };
        let mvp = *projection * self.model_matrix.to_mat4();
        renderer.draw(core, &mvp);
    }

    /// Drops every clip, manager entry and engine object.
    pub fn release(&mut self) {
        self.left_arm_manager.release();
        self.right_arm_manager.release();
        self.motion_manager.release();
        self.expression_manager.release();
        self.wav.release();
        self.motions.clear();
        self.expressions.clear();
        self.renderer = None;
        self.physics = None;
        self.pose = None;
        self.core = None;
    }

    #[must_use]
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }
}
