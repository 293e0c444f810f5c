//! Model load state machine.
//!
//! Loading walks a fixed list of [`LoadStage`]s. Synchronous stages run
//! back-to-back inside [`ModelInstance::run_stages`]; a stage that issues
//! fetches parks the model in the matching `Wait*` stage until every fetch of
//! that stage has completed. Optional assets the manifest does not declare
//! are skipped without fetching anything.

use std::rc::Rc;

use rand::Rng;

use crate::animation::{Breath, ExpressionClip, EyeBlink, MotionClip, Pose};
use crate::assets::{AssetLoader, AssetRequest, FetchTicket, TextureImage, join_path};
use crate::errors::{Result, WidgetError};
use crate::model::{ModelInstance, ModelMatrix, ModelSetting, UserData};

/// Progress through the load sequence.
///
/// Stages only move forward. `CompleteSetup` and `LoadFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStage {
    LoadAssets,
    LoadModel,
    WaitLoadModel,
    LoadExpression,
    WaitLoadExpression,
    LoadPhysics,
    WaitLoadPhysics,
    LoadPose,
    WaitLoadPose,
    SetupEyeBlink,
    SetupBreath,
    LoadUserData,
    WaitLoadUserData,
    SetupEyeBlinkIds,
    SetupLipSyncIds,
    SetupLayout,
    LoadMotion,
    WaitLoadMotion,
    LoadTexture,
    WaitLoadTexture,
    CompleteSetup,
    LoadFailed,
}

impl LoadStage {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStage::CompleteSetup | LoadStage::LoadFailed)
    }

    /// Stages that sit on outstanding fetches.
    #[must_use]
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            LoadStage::LoadAssets
                | LoadStage::WaitLoadModel
                | LoadStage::WaitLoadExpression
                | LoadStage::WaitLoadPhysics
                | LoadStage::WaitLoadPose
                | LoadStage::WaitLoadUserData
                | LoadStage::WaitLoadMotion
                | LoadStage::WaitLoadTexture
        )
    }

    /// Whether a completion for `request` belongs to this stage.
    #[must_use]
    pub fn accepts(self, request: &AssetRequest) -> bool {
        matches!(
            (self, request),
            (LoadStage::LoadAssets, AssetRequest::Setting)
                | (LoadStage::WaitLoadModel, AssetRequest::Moc)
                | (LoadStage::WaitLoadExpression, AssetRequest::Expression { .. })
                | (LoadStage::WaitLoadPhysics, AssetRequest::Physics)
                | (LoadStage::WaitLoadPose, AssetRequest::Pose)
                | (LoadStage::WaitLoadUserData, AssetRequest::UserData)
                | (LoadStage::WaitLoadMotion, AssetRequest::Motion { preload: true, .. })
                | (LoadStage::WaitLoadTexture, AssetRequest::Texture { .. })
        )
    }
}

/// Completed vs. issued fetches of the current `Wait*` stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub expected: usize,
}

impl LoadProgress {
    fn expect(expected: usize) -> Self {
        Self { loaded: 0, expected }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.expected
    }
}

/// Host-facing summary of a model's load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading {
        stage: LoadStage,
        progress: LoadProgress,
    },
    Ready,
    Failed(String),
}

impl ModelInstance {
    /// Starts loading: fetches `<home>/<name>.model3.json`.
    pub fn load_assets(&mut self, loader: &AssetLoader) {
        self.trail.clear();
        self.enter(LoadStage::LoadAssets);
        let path = join_path(&self.home_dir, &self.manifest_file);
        self.fetch(loader, AssetRequest::Setting, path);
    }

    #[must_use]
    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    /// Every stage entered so far, in order.
    #[must_use]
    pub fn trail(&self) -> &[LoadStage] {
        &self.trail
    }

    #[must_use]
    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&WidgetError> {
        self.load_error.as_ref()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.stage == LoadStage::CompleteSetup
    }

    #[must_use]
    pub fn load_status(&self) -> LoadStatus {
        match self.stage {
            LoadStage::CompleteSetup => LoadStatus::Ready,
            LoadStage::LoadFailed => LoadStatus::Failed(
                self.load_error
                    .as_ref()
                    .map_or_else(|| "unknown error".to_string(), ToString::to_string),
            ),
            stage => LoadStatus::Loading {
                stage,
                progress: self.progress,
            },
        }
    }

    /// Routes a finished fetch into the model.
    ///
    /// Voice data and lazily fetched motions are accepted at any stage.
    /// Load-stage completions that do not belong to the current stage are
    /// dropped.
    pub fn on_asset_loaded(
        &mut self,
        request: AssetRequest,
        path: &str,
        result: Result<Vec<u8>>,
        loader: &AssetLoader,
    ) {
        match request {
            AssetRequest::Voice { generation } => self.on_voice_loaded(generation, path, result),
            AssetRequest::Motion {
                group,
                index,
                preload: false,
            } => self.on_lazy_motion_loaded(&group, index, path, result),
            request => {
                if !self.stage.accepts(&request) {
                    log::debug!(
                        "Dropping {request:?} completion for '{path}' in stage {:?}",
                        self.stage
                    );
                    return;
                }
                let outcome = result.and_then(|bytes| self.accept_stage_asset(&request, path, &bytes));
                match outcome {
                    Ok(()) => {
                        if let Err(err) = self.run_stages(loader) {
                            self.fail(err);
                        }
                    }
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    /// Counts frame time against the current stage; fails the load once the
    /// stage has waited longer than the configured timeout.
    pub(crate) fn tick_load_timeout(&mut self, dt: f32) {
        if self.stage.is_terminal() {
            return;
        }
        self.stage_elapsed += dt;
        if self.stage_elapsed > self.options.stage_timeout_secs {
            let err = WidgetError::LoadTimeout {
                stage: self.stage,
                seconds: self.stage_elapsed,
            };
            self.fail(err);
        }
    }

    // ------------------------------------------------------------------
    // Stage plumbing
    // ------------------------------------------------------------------

    fn enter(&mut self, stage: LoadStage) {
        self.stage = stage;
        self.stage_elapsed = 0.0;
        self.trail.push(stage);
    }

    fn fail(&mut self, err: WidgetError) {
        log::error!("Model '{}' failed to load: {err}", self.manifest_file);
        self.load_error = Some(err);
        self.enter(LoadStage::LoadFailed);
    }

    fn fetch(&self, loader: &AssetLoader, request: AssetRequest, path: String) {
        loader.fetch(
            FetchTicket {
                model: self.handle,
                request,
            },
            path,
        );
    }

    fn asset_path(&self, file: &str) -> String {
        join_path(&self.home_dir, file)
    }

    fn setting_rc(&self) -> Result<Rc<ModelSetting>> {
        self.setting
            .clone()
            .ok_or_else(|| WidgetError::InvalidAsset {
                path: self.manifest_file.clone(),
                reason: "manifest not loaded".into(),
            })
    }

    /// Consumes the bytes of one stage fetch and bumps the stage counter.
    fn accept_stage_asset(&mut self, request: &AssetRequest, path: &str, bytes: &[u8]) -> Result<()> {
        match request {
            AssetRequest::Setting => {
                self.setting = Some(Rc::new(ModelSetting::from_json(bytes)?));
                self.enter(LoadStage::LoadModel);
                return Ok(());
            }
            AssetRequest::Moc => {
                let core = self.engine.load_model(bytes)?;
                let canvas = core.canvas_size();
                self.model_matrix = ModelMatrix::new(canvas.x, canvas.y);
                self.core = Some(core);
            }
            AssetRequest::Expression { index } => {
                let setting = self.setting_rc()?;
                let clip = ExpressionClip::from_json(bytes)?;
                self.expressions.insert(setting.expression_name(*index), clip);
            }
            AssetRequest::Physics => {
                self.physics = Some(self.engine.load_physics(bytes)?);
            }
            AssetRequest::Pose => {
                self.pose = Some(Pose::from_json(bytes)?);
            }
            AssetRequest::UserData => {
                self.user_data = Some(UserData::from_json(bytes)?);
            }
            AssetRequest::Motion { group, index, .. } => {
                let clip = self.prepare_motion(group, *index, bytes)?;
                let key = motion_key(group, *index);
                if self.options.debug {
                    log::debug!("[APP]load motion: {path} => [{key}]");
                }
                self.motions.insert(key, clip);
            }
            AssetRequest::Texture { slot } => {
                let image = TextureImage::decode(bytes, true).map_err(|err| WidgetError::InvalidAsset {
                    path: path.to_string(),
                    reason: err.to_string(),
                })?;
                if let Some(renderer) = &mut self.renderer {
                    renderer.bind_texture(*slot, &image);
                }
            }
            AssetRequest::Voice { .. } => {}
        }
        self.progress.loaded += 1;
        Ok(())
    }

    /// Parses a motion clip and applies manifest fade overrides and effect ids.
    pub(crate) fn prepare_motion(&self, group: &str, index: usize, bytes: &[u8]) -> Result<MotionClip> {
        let setting = self.setting_rc()?;
        let mut clip = MotionClip::from_json(bytes)?;
        clip.apply_fade_overrides(
            setting.motion_fade_in_time(group, index),
            setting.motion_fade_out_time(group, index),
        );
        clip.set_effect_ids(&self.eye_blink_ids, &self.lip_sync_ids);
        Ok(clip)
    }

    /// Runs synchronous stages until the machine parks in a `Wait*` stage or
    /// reaches a terminal one.
    pub(crate) fn run_stages(&mut self, loader: &AssetLoader) -> Result<()> {
        loop {
            let setting = self.setting_rc()?;
            let next = match self.stage {
                LoadStage::LoadModel => {
                    let file = setting.model_file_name();
                    if file.is_empty() {
                        return Err(WidgetError::MissingModelFile(self.manifest_file.clone()));
                    }
                    self.progress = LoadProgress::expect(1);
                    self.fetch(loader, AssetRequest::Moc, self.asset_path(file));
                    LoadStage::WaitLoadModel
                }
                LoadStage::LoadExpression => {
                    let count = setting.expression_count();
                    if count == 0 {
                        LoadStage::LoadPhysics
                    } else {
                        self.progress = LoadProgress::expect(count);
                        for index in 0..count {
                            let path = self.asset_path(setting.expression_file_name(index));
                            self.fetch(loader, AssetRequest::Expression { index }, path);
                        }
                        LoadStage::WaitLoadExpression
                    }
                }
                LoadStage::LoadPhysics => {
                    if self.fetch_optional(loader, setting.physics_file_name(), AssetRequest::Physics) {
                        LoadStage::WaitLoadPhysics
                    } else {
                        LoadStage::LoadPose
                    }
                }
                LoadStage::LoadPose => {
                    if self.fetch_optional(loader, setting.pose_file_name(), AssetRequest::Pose) {
                        LoadStage::WaitLoadPose
                    } else {
                        LoadStage::SetupEyeBlink
                    }
                }
                LoadStage::SetupEyeBlink => {
                    let ids = setting.eye_blink_parameter_ids();
                    if !ids.is_empty() {
                        let seed = self.rng.random::<u64>();
                        self.eye_blink = Some(EyeBlink::new(ids, seed));
                    }
                    LoadStage::SetupBreath
                }
                LoadStage::SetupBreath => {
                    self.breath = Some(Breath::standard());
                    LoadStage::LoadUserData
                }
                LoadStage::LoadUserData => {
                    if self.fetch_optional(loader, setting.user_data_file(), AssetRequest::UserData) {
                        LoadStage::WaitLoadUserData
                    } else {
                        LoadStage::SetupEyeBlinkIds
                    }
                }
                LoadStage::SetupEyeBlinkIds => {
                    self.eye_blink_ids = setting.eye_blink_parameter_ids();
                    LoadStage::SetupLipSyncIds
                }
                LoadStage::SetupLipSyncIds => {
                    self.lip_sync_ids = setting.lip_sync_parameter_ids();
                    LoadStage::SetupLayout
                }
                LoadStage::SetupLayout => {
                    self.model_matrix.setup_from_layout(&setting.layout());
                    LoadStage::LoadMotion
                }
                LoadStage::LoadMotion => {
                    if let Some(core) = &mut self.core {
                        core.save_parameters();
                    }
                    let total = setting.total_motion_count();
                    if total == 0 {
                        LoadStage::LoadTexture
                    } else {
                        self.progress = LoadProgress::expect(total);
                        for group in setting.motion_group_names() {
                            for index in 0..setting.motion_count(group) {
                                // Keeps on-demand lookups from fetching the clip again.
                                self.motions.mark_pending(&motion_key(group, index));
                                let path = self.asset_path(setting.motion_file_name(group, index));
                                let request = AssetRequest::Motion {
                                    group: group.to_string(),
                                    index,
                                    preload: true,
                                };
                                self.fetch(loader, request, path);
                            }
                        }
                        LoadStage::WaitLoadMotion
                    }
                }
                LoadStage::LoadTexture => {
                    self.motion_manager.stop_all_motions();
                    let mut renderer = self.engine.create_renderer();
                    renderer.set_premultiplied_alpha(true);
                    self.renderer = Some(renderer);

                    // Empty slots are skipped and do not count towards completion.
                    let slots: Vec<usize> = (0..setting.texture_count())
                        .filter(|slot| {
                            let named = !setting.texture_file_name(*slot).is_empty();
                            if !named {
                                log::warn!("Texture slot {slot} has no file name");
                            }
                            named
                        })
                        .collect();
                    self.progress = LoadProgress::expect(slots.len());
                    for slot in slots {
                        let path = self.asset_path(setting.texture_file_name(slot));
                        self.fetch(loader, AssetRequest::Texture { slot }, path);
                    }
                    LoadStage::WaitLoadTexture
                }
                LoadStage::WaitLoadModel => {
                    if self.core.is_none() {
                        return Ok(());
                    }
                    LoadStage::LoadExpression
                }
                LoadStage::WaitLoadExpression => self.after_wait(LoadStage::LoadPhysics),
                LoadStage::WaitLoadPhysics => self.after_wait(LoadStage::LoadPose),
                LoadStage::WaitLoadPose => self.after_wait(LoadStage::SetupEyeBlink),
                LoadStage::WaitLoadUserData => self.after_wait(LoadStage::SetupEyeBlinkIds),
                LoadStage::WaitLoadMotion => self.after_wait(LoadStage::LoadTexture),
                LoadStage::WaitLoadTexture => self.after_wait(LoadStage::CompleteSetup),
                LoadStage::LoadAssets | LoadStage::CompleteSetup | LoadStage::LoadFailed => {
                    return Ok(());
                }
            };

            if next == self.stage {
                return Ok(());
            }
            self.enter(next);
            if next == LoadStage::CompleteSetup {
                log::info!("Model '{}' ready", self.manifest_file);
                return Ok(());
            }
        }
    }

    /// Fetches a single optional asset. Returns false when the manifest names
    /// no file for it, in which case the stage is skipped.
    fn fetch_optional(&mut self, loader: &AssetLoader, file: &str, request: AssetRequest) -> bool {
        if file.is_empty() {
            return false;
        }
        self.progress = LoadProgress::expect(1);
        self.fetch(loader, request, self.asset_path(file));
        true
    }

    fn after_wait(&self, next: LoadStage) -> LoadStage {
        if self.progress.is_complete() {
            next
        } else {
            self.stage
        }
    }
}

/// Cache key of a motion clip.
#[must_use]
pub fn motion_key(group: &str, index: usize) -> String {
    format!("{group}_{index}")
}
