//! Widget Facade
//!
//! [`Widget`] is the host-facing entry point. It wires the asset loader, the
//! scene, the hit-area event registry and the pointer state together, and is
//! driven by the host's render loop and input callbacks.
//!
//! # Example
//!
//! ```rust,ignore
//! use live2d_widget::{Platform, Widget, WidgetConfig};
//!
//! let config = WidgetConfig::with_source("/live2d/models", &["Haru"]);
//! let mut widget = Widget::init(config, platform).await?;
//! widget.on(HitArea::Head, || println!("head tapped"));
//!
//! // Render loop
//! loop {
//!     widget.frame();
//! }
//! ```

use std::rc::Rc;

use crate::assets::{AssetLoader, AssetReader};
use crate::audio::AudioPlayer;
use crate::config::WidgetConfig;
use crate::engine::{ModelEngine, RenderSurface};
use crate::errors::{Result, WidgetError};
use crate::events::{EventEmitter, HitArea, ListenerId};
use crate::input::{TouchManager, ViewTransform};
use crate::model::{FrameReport, LoadStatus, ModelHandle};
use crate::scene::SceneManager;
use crate::utils::FrameClock;

/// Host-provided collaborators.
pub struct Platform {
    /// Byte source for model bundles and the engine bootstrap.
    pub reader: Rc<dyn AssetReader>,
    pub engine: Rc<dyn ModelEngine>,
    pub surface: Box<dyn RenderSurface>,
    /// `None` disables voice playback; lip-sync analysis still runs.
    pub audio: Option<Rc<dyn AudioPlayer>>,
}

/// An initialised widget.
///
/// # Lifecycle
///
/// 1. Create with [`Widget::init`]
/// 2. Forward pointer events ([`Widget::pointer_down`], [`Widget::pointer_move`],
///    [`Widget::pointer_up`]) and resizes ([`Widget::resize`])
/// 3. Call [`Widget::frame`] (or [`Widget::tick`]) once per rendered frame
/// 4. Tear down with [`Widget::release`]
pub struct Widget {
    config: WidgetConfig,
    loader: AssetLoader,
    scene: SceneManager,
    emitter: EventEmitter,
    surface: Box<dyn RenderSurface>,
    engine: Rc<dyn ModelEngine>,
    touch: TouchManager,
    view: ViewTransform,
    clock: FrameClock,
    released: bool,
}

impl Widget {
    /// Validates `config`, acquires the render surface, boots the animation
    /// engine if needed and starts loading the first model.
    ///
    /// # Errors
    ///
    /// - [`WidgetError::Config`] for an unusable configuration
    /// - [`WidgetError::RenderContext`] if the surface cannot be initialised
    /// - [`WidgetError::Bootstrap`] if the engine bootstrap cannot be read or run
    ///
    /// Model asset failures are not reported here; they surface through
    /// [`Widget::load_status`].
    pub async fn init(config: WidgetConfig, platform: Platform) -> Result<Self> {
        config.validate()?;

        let Platform {
            reader,
            engine,
            mut surface,
            audio,
        } = platform;

        let (width, height) = surface
            .initialize(config.canvas)
            .map_err(|err| WidgetError::RenderContext(err.to_string()))?;
        let view = ViewTransform::new(width, height, config.scale);

        if !engine.is_started() {
            log::info!("Loading animation engine from '{}'", config.cubism_core_path);
            let bootstrap = reader
                .read_bytes(&config.cubism_core_path)
                .await
                .map_err(|err| WidgetError::Bootstrap(err.to_string()))?;
            engine
                .start_up(&bootstrap)
                .map_err(|err| WidgetError::Bootstrap(err.to_string()))?;
        }

        let loader = AssetLoader::new(reader);
        let mut scene = SceneManager::new(&config, engine.clone(), audio);
        scene.change_scene(0, &loader);

        log::info!("Widget initialised ({width}x{height}, {} model(s))", config.source.models.len());

        Ok(Self {
            config,
            loader,
            scene,
            emitter: EventEmitter::new(),
            surface,
            engine,
            touch: TouchManager::new(),
            view,
            clock: FrameClock::new(),
            released: false,
        })
    }

    /// Releases the models, the surface and the engine's global state.
    ///
    /// Returns false if the widget was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.scene.release_all();
        self.surface.release();
        self.engine.dispose();
        self.released = true;
        log::info!("Widget released");
        true
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    // ========== Events ==========

    pub fn on(&mut self, area: HitArea, callback: impl FnMut() + 'static) -> ListenerId {
        self.emitter.on(area, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.emitter.off(id)
    }

    pub fn emit(&mut self, area: HitArea) {
        self.emitter.emit(area);
    }

    // ========== Frame ==========

    /// Advances the widget by `dt` seconds and draws.
    ///
    /// Routes finished fetches, clears the surface and updates every model.
    /// Returns the current model's frame report.
    pub fn tick(&mut self, dt: f32) -> Option<FrameReport> {
        if self.released {
            return None;
        }
        self.scene.pump(&mut self.loader);
        self.surface.begin_frame();
        self.scene.set_view_matrix(self.view.matrix());
        let (width, height) = self.surface.size();
        self.scene.on_update(width, height, dt, &self.loader)
    }

    /// [`Widget::tick`] with the delta measured by the frame clock.
    pub fn frame(&mut self) -> Option<FrameReport> {
        let dt = self.clock.tick();
        self.tick(dt)
    }

    /// Blocks until every outstanding fetch has been routed.
    ///
    /// Only for readers whose reads always resolve.
    pub fn settle(&mut self) {
        self.scene.settle(&mut self.loader);
    }

    // ========== Pointer input ==========

    /// Pointer pressed at device pixel `(x, y)`.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.touch.touches_began(x, y);
    }

    /// Pointer moved to device pixel `(x, y)`; the model looks towards it.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.touch.touches_moved(x, y);
        let view_x = self.view.transform_view_x(x);
        let view_y = self.view.transform_view_y(y);
        self.scene.on_drag(view_x, view_y);
    }

    /// Pointer released. Resets the drag and resolves a tap at the last
    /// pointer position.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> Option<HitArea> {
        self.touch.touches_moved(x, y);
        self.touch.touches_ended();
        self.scene.on_drag(0.0, 0.0);

        let screen_x = self.view.device_to_screen_x(self.touch.x());
        let screen_y = self.view.device_to_screen_y(self.touch.y());
        self.scene.on_tap(screen_x, screen_y, &self.loader, &mut self.emitter)
    }

    /// Zooms the view around screen point `(cx, cy)`.
    pub fn zoom(&mut self, cx: f32, cy: f32, factor: f32) {
        self.view.adjust_scale(cx, cy, factor);
    }

    /// Re-measures an auto-sized canvas. Fixed canvases ignore resizes.
    ///
    /// Returns true if the layout was rebuilt.
    pub fn resize(&mut self) -> bool {
        if !self.config.canvas.is_auto() {
            return false;
        }
        let (width, height) = self.surface.resize();
        self.view = ViewTransform::new(width, height, self.config.scale);
        log::debug!("Canvas resized to {width}x{height}");
        true
    }

    // ========== Scenes ==========

    pub fn change_scene(&mut self, index: usize) -> Option<ModelHandle> {
        self.clock.reset();
        self.scene.change_scene(index, &self.loader)
    }

    pub fn next_scene(&mut self) -> Option<ModelHandle> {
        self.clock.reset();
        self.scene.next_scene(&self.loader)
    }

    pub fn prev_scene(&mut self) -> Option<ModelHandle> {
        self.clock.reset();
        self.scene.prev_scene(&self.loader)
    }

    /// Load status of the current model.
    #[must_use]
    pub fn load_status(&self) -> Option<LoadStatus> {
        self.scene.current_model().map(|model| model.load_status())
    }

    // ========== Accessors ==========

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    #[must_use]
    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneManager {
        &mut self.scene
    }

    #[must_use]
    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut AssetLoader {
        &mut self.loader
    }

    #[must_use]
    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    #[must_use]
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    #[must_use]
    pub fn touch(&self) -> &TouchManager {
        &self.touch
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.surface.size()
    }
}
