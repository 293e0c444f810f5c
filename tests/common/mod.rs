//! Shared test fixtures
//!
//! - [`TestEngine`]: in-memory animation engine backed by [`ParameterModel`]
//! - [`BundleReader`]: resolves immediately and records every requested path
//! - [`ManualReader`]: fetches stay pending until the test resolves them
//! - [`ModelBundle`]: builds a model3.json manifest plus the files it names
//! - WAV, PNG, motion3 and exp3 byte builders

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use glam::{Mat4, Vec2};
use serde::Deserialize;
use serde_json::{Value, json};

use live2d_widget::assets::{AssetLoader, AssetReader, MemoryAssetReader, TextureImage, join_path};
use live2d_widget::audio::AudioPlayer;
use live2d_widget::config::{CanvasMode, WidgetConfig};
use live2d_widget::engine::parameters::DrawableRect;
use live2d_widget::engine::{CoreModel, ModelEngine, ModelRenderer, ParameterModel, PhysicsRig, RenderSurface};
use live2d_widget::errors::{Result, WidgetError};
use live2d_widget::scene::SceneManager;

pub const EPSILON: f32 = 1e-5;
pub const MODEL_ROOT: &str = "models";
pub const CORE_SCRIPT: &str = "/live2d/core/live2dCubismCore.min.js";

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Config with a fixed seed and debug logging.
pub fn test_config(models: &[&str]) -> WidgetConfig {
    let mut config = WidgetConfig::with_source(MODEL_ROOT, models);
    config.seed = Some(7);
    config.debug = true;
    config.cubism_core_path = CORE_SCRIPT.to_string();
    config
}

// ============================================================================
// Engine
// ============================================================================

/// Everything the test engine, its renderers and physics rigs observed.
#[derive(Default)]
pub struct EngineCalls {
    pub start_ups: Cell<usize>,
    pub disposals: Cell<usize>,
    pub models_loaded: Cell<usize>,
    pub physics_evaluations: Cell<usize>,
    pub premultiplied_alpha: Cell<bool>,
    /// `(slot, width, height, premultiplied)` per bound texture.
    pub texture_binds: RefCell<Vec<(usize, u32, u32, bool)>>,
    pub draws: RefCell<Vec<Mat4>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MocJson {
    canvas: [f32; 2],
    #[serde(default)]
    drawables: BTreeMap<String, [f32; 4]>,
    #[serde(default)]
    parameters: BTreeMap<String, [f32; 3]>,
}

/// Engine whose "moc" files are JSON descriptions of a [`ParameterModel`]:
/// `{"Canvas": [w, h], "Drawables": {id: [l, t, r, b]}, "Parameters": {id: [min, max, default]}}`.
pub struct TestEngine {
    started: Cell<bool>,
    reject_bootstrap: bool,
    pub calls: Rc<EngineCalls>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self {
            started: Cell::new(false),
            reject_bootstrap: false,
            calls: Rc::new(EngineCalls::default()),
        }
    }

    pub fn rejecting_bootstrap() -> Self {
        Self {
            reject_bootstrap: true,
            ..Self::new()
        }
    }
}

impl ModelEngine for TestEngine {
    fn is_started(&self) -> bool {
        self.started.get()
    }

    fn start_up(&self, bootstrap: &[u8]) -> Result<()> {
        if self.reject_bootstrap || bootstrap.is_empty() {
            return Err(WidgetError::Bootstrap("core script rejected".into()));
        }
        self.started.set(true);
        self.calls.start_ups.set(self.calls.start_ups.get() + 1);
        Ok(())
    }

    fn dispose(&self) {
        self.started.set(false);
        self.calls.disposals.set(self.calls.disposals.get() + 1);
    }

    fn load_model(&self, moc: &[u8]) -> Result<Box<dyn CoreModel>> {
        let json: MocJson = serde_json::from_slice(moc)?;
        let mut model = ParameterModel::new(Vec2::new(json.canvas[0], json.canvas[1]));
        for (id, [left, top, right, bottom]) in json.drawables {
            model = model.with_drawable(
                &id,
                DrawableRect {
                    left,
                    top,
                    right,
                    bottom,
                },
            );
        }
        for (id, [min, max, default]) in json.parameters {
            model = model.with_parameter(&id, min, max, default);
        }
        self.calls.models_loaded.set(self.calls.models_loaded.get() + 1);
        Ok(Box::new(model))
    }

    fn load_physics(&self, _physics: &[u8]) -> Result<Box<dyn PhysicsRig>> {
        Ok(Box::new(TestPhysics {
            calls: self.calls.clone(),
        }))
    }

    fn create_renderer(&self) -> Box<dyn ModelRenderer> {
        Box::new(TestRenderer {
            calls: self.calls.clone(),
        })
    }
}

pub const PARAM_HAIR: &str = "ParamHairFront";

struct TestPhysics {
    calls: Rc<EngineCalls>,
}

impl PhysicsRig for TestPhysics {
    fn evaluate(&mut self, model: &mut dyn CoreModel, _dt: f32) {
        model.set_parameter_value(PARAM_HAIR, 0.25, 1.0);
        self.calls
            .physics_evaluations
            .set(self.calls.physics_evaluations.get() + 1);
    }
}

struct TestRenderer {
    calls: Rc<EngineCalls>,
}

impl ModelRenderer for TestRenderer {
    fn bind_texture(&mut self, slot: usize, image: &TextureImage) {
        self.calls
            .texture_binds
            .borrow_mut()
            .push((slot, image.width, image.height, image.premultiplied));
    }

    fn set_premultiplied_alpha(&mut self, enabled: bool) {
        self.calls.premultiplied_alpha.set(enabled);
    }

    fn draw(&mut self, _model: &dyn CoreModel, mvp: &Mat4) {
        self.calls.draws.borrow_mut().push(*mvp);
    }
}

// ============================================================================
// Surface and audio
// ============================================================================

#[derive(Default)]
pub struct SurfaceCalls {
    pub frames: Cell<usize>,
    pub released: Cell<bool>,
    /// Size an auto canvas measures on initialise/resize.
    pub host_size: Cell<(u32, u32)>,
}

pub struct TestSurface {
    size: (u32, u32),
    unavailable: bool,
    pub calls: Rc<SurfaceCalls>,
}

impl TestSurface {
    pub fn new() -> Self {
        let calls = SurfaceCalls::default();
        calls.host_size.set((800, 600));
        Self {
            size: (0, 0),
            unavailable: false,
            calls: Rc::new(calls),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }
}

impl RenderSurface for TestSurface {
    fn initialize(&mut self, canvas: CanvasMode) -> Result<(u32, u32)> {
        if self.unavailable {
            return Err(WidgetError::RenderContext("no graphics context".into()));
        }
        self.size = match canvas {
            CanvasMode::Fixed { width, height } => (width, height),
            CanvasMode::Auto(_) => self.calls.host_size.get(),
        };
        Ok(self.size)
    }

    fn resize(&mut self) -> (u32, u32) {
        self.size = self.calls.host_size.get();
        self.size
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn begin_frame(&mut self) {
        self.calls.frames.set(self.calls.frames.get() + 1);
    }

    fn release(&mut self) {
        self.calls.released.set(true);
    }
}

#[derive(Default)]
pub struct RecordingAudio {
    pub played: RefCell<Vec<String>>,
    pub stops: Cell<usize>,
    pub fail: bool,
}

impl AudioPlayer for RecordingAudio {
    fn play(&self, path: &str) -> LocalBoxFuture<'static, Result<()>> {
        self.played.borrow_mut().push(path.to_string());
        let result = if self.fail {
            Err(WidgetError::FetchFailed {
                path: path.to_string(),
                reason: "autoplay blocked".into(),
            })
        } else {
            Ok(())
        };
        futures::future::ready(result).boxed_local()
    }

    fn stop(&self) {
        self.stops.set(self.stops.get() + 1);
    }
}

// ============================================================================
// Readers
// ============================================================================

fn normalize(path: &str) -> String {
    join_path("", path)
}

/// In-memory reader that answers at once and logs every requested path.
#[derive(Default)]
pub struct BundleReader {
    pub files: MemoryAssetReader,
    requests: RefCell<Vec<String>>,
}

impl BundleReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        let path = normalize(path);
        self.requests.borrow().iter().filter(|p| **p == path).count()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl AssetReader for BundleReader {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        self.requests.borrow_mut().push(normalize(path));
        self.files.read_bytes(path)
    }
}

type PendingFetch = (String, oneshot::Sender<Result<Vec<u8>>>);

/// Reader whose fetches complete only when the test resolves them, in any
/// order. Resolved bytes come from the in-memory bundle.
#[derive(Default)]
pub struct ManualReader {
    pub files: MemoryAssetReader,
    pending: RefCell<Vec<PendingFetch>>,
    requests: RefCell<Vec<String>>,
}

impl ManualReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Paths of the fetches still waiting, in issue order.
    pub fn pending_paths(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Completes the oldest pending fetch of `path` from the bundle.
    pub fn resolve(&self, path: &str) -> bool {
        let bytes = futures::executor::block_on(self.files.read_bytes(path));
        self.resolve_with(path, bytes)
    }

    /// Completes the oldest pending fetch of `path` with `result`.
    pub fn resolve_with(&self, path: &str, result: Result<Vec<u8>>) -> bool {
        let path = normalize(path);
        let sender = {
            let mut pending = self.pending.borrow_mut();
            let Some(index) = pending.iter().position(|(p, _)| *p == path) else {
                return false;
            };
            pending.remove(index).1
        };
        sender.send(result).is_ok()
    }

    /// Resolves every currently pending fetch in issue order.
    pub fn resolve_all(&self) -> usize {
        let paths = self.pending_paths();
        for path in &paths {
            self.resolve(path);
        }
        paths.len()
    }
}

impl AssetReader for ManualReader {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let path = normalize(path);
        let (sender, receiver) = oneshot::channel();
        self.requests.borrow_mut().push(path.clone());
        self.pending.borrow_mut().push((path.clone(), sender));
        async move {
            receiver.await.unwrap_or_else(|_| {
                Err(WidgetError::FetchFailed {
                    path,
                    reason: "fetch abandoned".into(),
                })
            })
        }
        .boxed_local()
    }
}

// ============================================================================
// Scene harness
// ============================================================================

pub struct SceneHarness<R> {
    pub reader: Rc<R>,
    pub engine: Rc<TestEngine>,
    pub loader: AssetLoader,
    pub scene: SceneManager,
}

pub fn scene_harness<R: AssetReader + 'static>(reader: R, config: &WidgetConfig) -> SceneHarness<R> {
    scene_harness_with_audio(reader, config, None)
}

pub fn scene_harness_with_audio<R: AssetReader + 'static>(
    reader: R,
    config: &WidgetConfig,
    audio: Option<Rc<dyn AudioPlayer>>,
) -> SceneHarness<R> {
    init_logger();
    let reader = Rc::new(reader);
    let engine = Rc::new(TestEngine::new());
    let loader = AssetLoader::new(reader.clone());
    let scene = SceneManager::new(config, engine.clone(), audio);
    SceneHarness {
        reader,
        engine,
        loader,
        scene,
    }
}

impl SceneHarness<ManualReader> {
    /// Resolves fetches (oldest first) and routes them until nothing is pending.
    pub fn drain(&mut self) {
        loop {
            self.scene.pump(&mut self.loader);
            if self.reader.resolve_all() == 0 {
                break;
            }
        }
        self.scene.pump(&mut self.loader);
    }

    /// Resolves one path and routes the completion.
    pub fn resolve(&mut self, path: &str) -> bool {
        let resolved = self.reader.resolve(path);
        self.scene.pump(&mut self.loader);
        resolved
    }
}

impl SceneHarness<BundleReader> {
    pub fn settle(&mut self) {
        self.scene.settle(&mut self.loader);
    }
}

// ============================================================================
// Model bundles
// ============================================================================

pub struct MotionFile {
    pub bytes: Vec<u8>,
    pub sound: Option<(String, Vec<u8>)>,
    pub fade_in: Option<f32>,
    pub fade_out: Option<f32>,
}

/// Builder for a model directory: manifest, moc and every referenced file.
pub struct ModelBundle {
    pub name: String,
    pub canvas: [f32; 2],
    pub with_moc: bool,
    pub drawables: Vec<(String, [f32; 4])>,
    pub hit_areas: Vec<(String, String)>,
    pub expressions: Vec<(String, Vec<u8>)>,
    pub motions: Vec<(String, Vec<MotionFile>)>,
    pub textures: Vec<String>,
    pub physics: bool,
    pub pose: bool,
    pub user_data: bool,
    pub eye_blink_ids: Vec<String>,
    pub lip_sync_ids: Vec<String>,
    pub layout: Vec<(String, f32)>,
}

impl ModelBundle {
    /// A model with a moc file and one texture, nothing optional.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            canvas: [2.0, 2.0],
            with_moc: true,
            drawables: Vec::new(),
            hit_areas: Vec::new(),
            expressions: Vec::new(),
            motions: Vec::new(),
            textures: vec!["texture_00.png".to_string()],
            physics: false,
            pose: false,
            user_data: false,
            eye_blink_ids: Vec::new(),
            lip_sync_ids: Vec::new(),
            layout: Vec::new(),
        }
    }

    pub fn without_moc(mut self) -> Self {
        self.with_moc = false;
        self
    }

    pub fn with_canvas(mut self, width: f32, height: f32) -> Self {
        self.canvas = [width, height];
        self
    }

    /// Adds a hit area backed by a rectangular drawable `HitArea<name>`.
    pub fn with_hit_area(mut self, name: &str, rect: [f32; 4]) -> Self {
        let id = format!("HitArea{name}");
        self.drawables.push((id.clone(), rect));
        self.hit_areas.push((name.to_string(), id));
        self
    }

    pub fn with_expression(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.expressions.push((name.to_string(), bytes));
        self
    }

    pub fn with_motion(self, group: &str, bytes: Vec<u8>) -> Self {
        self.with_motion_file(
            group,
            MotionFile {
                bytes,
                sound: None,
                fade_in: None,
                fade_out: None,
            },
        )
    }

    pub fn with_voiced_motion(self, group: &str, bytes: Vec<u8>, sound: &str, wav: Vec<u8>) -> Self {
        self.with_motion_file(
            group,
            MotionFile {
                bytes,
                sound: Some((sound.to_string(), wav)),
                fade_in: None,
                fade_out: None,
            },
        )
    }

    pub fn with_motion_file(mut self, group: &str, file: MotionFile) -> Self {
        match self.motions.iter_mut().find(|(g, _)| g == group) {
            Some((_, files)) => files.push(file),
            None => self.motions.push((group.to_string(), vec![file])),
        }
        self
    }

    pub fn with_textures(mut self, files: &[&str]) -> Self {
        self.textures = files.iter().map(|f| (*f).to_string()).collect();
        self
    }

    pub fn with_physics(mut self) -> Self {
        self.physics = true;
        self
    }

    pub fn with_pose(mut self) -> Self {
        self.pose = true;
        self
    }

    pub fn with_user_data(mut self) -> Self {
        self.user_data = true;
        self
    }

    pub fn with_eye_blink(mut self, ids: &[&str]) -> Self {
        self.eye_blink_ids = ids.iter().map(|i| (*i).to_string()).collect();
        self
    }

    pub fn with_lip_sync(mut self, ids: &[&str]) -> Self {
        self.lip_sync_ids = ids.iter().map(|i| (*i).to_string()).collect();
        self
    }

    pub fn with_layout(mut self, key: &str, value: f32) -> Self {
        self.layout.push((key.to_string(), value));
        self
    }

    /// Directory of the model under `MODEL_ROOT`.
    pub fn dir(&self) -> String {
        join_path(MODEL_ROOT, &self.name)
    }

    /// Full path of a bundle-relative file.
    pub fn path(&self, file: &str) -> String {
        join_path(&self.dir(), file)
    }

    pub fn manifest_path(&self) -> String {
        self.path(&format!("{}.model3.json", self.name))
    }

    pub fn moc_file(&self) -> String {
        format!("{}.moc3", self.name)
    }

    pub fn expression_file(name: &str) -> String {
        format!("expressions/{name}.exp3.json")
    }

    pub fn motion_file(group: &str, index: usize) -> String {
        format!("motions/{group}_{index}.motion3.json")
    }

    pub fn sound_file(sound: &str) -> String {
        format!("sounds/{sound}")
    }

    pub fn manifest(&self) -> Value {
        let mut refs = serde_json::Map::new();
        if self.with_moc {
            refs.insert("Moc".into(), json!(self.moc_file()));
        }
        refs.insert("Textures".into(), json!(self.textures));
        if self.physics {
            refs.insert("Physics".into(), json!(format!("{}.physics3.json", self.name)));
        }
        if self.pose {
            refs.insert("Pose".into(), json!(format!("{}.pose3.json", self.name)));
        }
        if self.user_data {
            refs.insert("UserData".into(), json!(format!("{}.userdata3.json", self.name)));
        }
        if !self.expressions.is_empty() {
            let expressions: Vec<Value> = self
                .expressions
                .iter()
                .map(|(name, _)| json!({ "Name": name, "File": Self::expression_file(name) }))
                .collect();
            refs.insert("Expressions".into(), Value::Array(expressions));
        }
        if !self.motions.is_empty() {
            let mut motions = serde_json::Map::new();
            for (group, files) in &self.motions {
                let entries: Vec<Value> = files
                    .iter()
                    .enumerate()
                    .map(|(index, file)| {
                        let mut entry = serde_json::Map::new();
                        entry.insert("File".into(), json!(Self::motion_file(group, index)));
                        if let Some((sound, _)) = &file.sound {
                            entry.insert("Sound".into(), json!(Self::sound_file(sound)));
                        }
                        if let Some(fade_in) = file.fade_in {
                            entry.insert("FadeInTime".into(), json!(fade_in));
                        }
                        if let Some(fade_out) = file.fade_out {
                            entry.insert("FadeOutTime".into(), json!(fade_out));
                        }
                        Value::Object(entry)
                    })
                    .collect();
                motions.insert(group.clone(), Value::Array(entries));
            }
            refs.insert("Motions".into(), Value::Object(motions));
        }

        let mut groups = Vec::new();
        if !self.eye_blink_ids.is_empty() {
            groups.push(json!({ "Target": "Parameter", "Name": "EyeBlink", "Ids": self.eye_blink_ids }));
        }
        if !self.lip_sync_ids.is_empty() {
            groups.push(json!({ "Target": "Parameter", "Name": "LipSync", "Ids": self.lip_sync_ids }));
        }

        let hit_areas: Vec<Value> = self
            .hit_areas
            .iter()
            .map(|(name, id)| json!({ "Id": id, "Name": name }))
            .collect();

        let layout: serde_json::Map<String, Value> = self
            .layout
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();

        json!({
            "Version": 3,
            "FileReferences": Value::Object(refs),
            "Groups": groups,
            "HitAreas": hit_areas,
            "Layout": Value::Object(layout),
        })
    }

    pub fn moc(&self) -> Vec<u8> {
        let drawables: serde_json::Map<String, Value> = self
            .drawables
            .iter()
            .map(|(id, rect)| (id.clone(), json!(rect)))
            .collect();
        serde_json::to_vec(&json!({ "Canvas": self.canvas, "Drawables": Value::Object(drawables) }))
            .unwrap_or_default()
    }

    /// Every file of the bundle with its full path.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        let mut files = vec![(
            self.manifest_path(),
            serde_json::to_vec(&self.manifest()).unwrap_or_default(),
        )];
        if self.with_moc {
            files.push((self.path(&self.moc_file()), self.moc()));
        }
        for texture in self.textures.iter().filter(|t| !t.is_empty()) {
            files.push((self.path(texture), png_bytes(2, 2)));
        }
        for (name, bytes) in &self.expressions {
            files.push((self.path(&Self::expression_file(name)), bytes.clone()));
        }
        for (group, motions) in &self.motions {
            for (index, file) in motions.iter().enumerate() {
                files.push((self.path(&Self::motion_file(group, index)), file.bytes.clone()));
                if let Some((sound, wav)) = &file.sound {
                    files.push((self.path(&Self::sound_file(sound)), wav.clone()));
                }
            }
        }
        if self.physics {
            files.push((self.path(&format!("{}.physics3.json", self.name)), b"{\"Version\":3}".to_vec()));
        }
        if self.pose {
            files.push((self.path(&format!("{}.pose3.json", self.name)), pose_json()));
        }
        if self.user_data {
            files.push((self.path(&format!("{}.userdata3.json", self.name)), user_data_json()));
        }
        files
    }

    pub fn install(&self, files: &MemoryAssetReader) {
        for (path, bytes) in self.files() {
            files.insert(&path, bytes);
        }
    }
}

// ============================================================================
// Asset byte builders
// ============================================================================

/// A motion holding each `(parameter, value)` constant for `duration` seconds,
/// without fades.
pub fn motion_json(duration: f32, looping: bool, values: &[(&str, f32)]) -> Vec<u8> {
    let curves: Vec<Value> = values
        .iter()
        .map(|(id, value)| {
            json!({
                "Target": "Parameter",
                "Id": id,
                "Segments": [0.0, value, 0.0, duration, value],
            })
        })
        .collect();
    serde_json::to_vec(&json!({
        "Version": 3,
        "Meta": {
            "Duration": duration,
            "Fps": 30.0,
            "Loop": looping,
            "CurveCount": curves.len(),
            "FadeInTime": 0.0,
            "FadeOutTime": 0.0,
        },
        "Curves": curves,
    }))
    .unwrap_or_default()
}

/// An expression adding each `(parameter, value)`, without fades.
pub fn expression_json(values: &[(&str, f32)]) -> Vec<u8> {
    let parameters: Vec<Value> = values
        .iter()
        .map(|(id, value)| json!({ "Id": id, "Value": value, "Blend": "Add" }))
        .collect();
    serde_json::to_vec(&json!({
        "Type": "Live2D Expression",
        "FadeInTime": 0.0,
        "FadeOutTime": 0.0,
        "Parameters": parameters,
    }))
    .unwrap_or_default()
}

pub fn pose_json() -> Vec<u8> {
    br#"{
        "Type": "Live2D Pose",
        "FadeInTime": 0.5,
        "Groups": [[
            { "Id": "PartArmA", "Link": [] },
            { "Id": "PartArmB", "Link": [] }
        ]]
    }"#
    .to_vec()
}

pub fn user_data_json() -> Vec<u8> {
    br#"{
        "Version": 3,
        "Meta": { "UserDataCount": 1, "TotalUserDataSize": 5 },
        "UserData": [{ "Target": "ArtMesh", "Id": "ArtMesh1", "Value": "hello" }]
    }"#
    .to_vec()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![255u8; (width * height * 4) as usize];
    let mut png = Vec::new();
    if let Some(image) = image::RgbaImage::from_raw(width, height, pixels) {
        let _ = image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png);
    }
    png
}

/// A RIFF/WAVE file with an arbitrary format tag and raw sample data.
pub fn wav_raw(format: u16, channels: u16, sample_rate: u32, bits: u16, data: &[u8]) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut out = Vec::with_capacity(44 + data.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&format.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// 16-bit linear PCM, samples interleaved across channels.
pub fn wav_pcm16(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    wav_raw(1, channels, sample_rate, 16, &data)
}

/// The normalized value the decoder produces for a 16-bit sample.
pub fn pcm16_value(sample: i16) -> f32 {
    (i32::from(sample) << 16) as f32 / 2_147_483_647.0
}
