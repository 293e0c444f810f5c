//! Widget Facade Tests
//!
//! Tests for:
//! - Initialisation failures (config, render context, engine bootstrap)
//! - Engine bootstrap skipped when already started
//! - Frame driving and load status
//! - Pointer taps and drags reaching the scene
//! - Resize handling for auto and fixed canvases
//! - Idempotent release

mod common;

use std::cell::Cell;
use std::rc::Rc;

use futures::executor::block_on;

use common::*;

use live2d_widget::assets::AssetReader;
use live2d_widget::config::CanvasMode;
use live2d_widget::engine::ModelEngine;
use live2d_widget::errors::WidgetError;
use live2d_widget::events::HitArea;
use live2d_widget::model::LoadStatus;
use live2d_widget::widget::{Platform, Widget};

struct Fixture {
    reader: Rc<BundleReader>,
    engine: Rc<TestEngine>,
    surface: Rc<SurfaceCalls>,
}

fn bundle_reader(bundle: &ModelBundle) -> Rc<BundleReader> {
    let reader = BundleReader::new();
    bundle.install(&reader.files);
    reader.files.insert(CORE_SCRIPT, b"core".to_vec());
    Rc::new(reader)
}

fn platform(reader: &Rc<BundleReader>, engine: &Rc<TestEngine>, surface: TestSurface) -> Platform {
    let reader: Rc<dyn AssetReader> = reader.clone();
    let engine: Rc<dyn ModelEngine> = engine.clone();
    Platform {
        reader,
        engine,
        surface: Box::new(surface),
        audio: None,
    }
}

fn init_widget(bundle: &ModelBundle, canvas: CanvasMode) -> (Widget, Fixture) {
    init_logger();
    let reader = bundle_reader(bundle);
    let engine = Rc::new(TestEngine::new());
    let surface = TestSurface::new();
    let calls = surface.calls.clone();

    let mut config = test_config(&[bundle.name.as_str()]);
    config.canvas = canvas;
    let mut widget = block_on(Widget::init(config, platform(&reader, &engine, surface))).expect("widget initialises");
    widget.settle();
    (
        widget,
        Fixture {
            reader,
            engine,
            surface: calls,
        },
    )
}

fn fixed() -> CanvasMode {
    CanvasMode::Fixed {
        width: 280,
        height: 360,
    }
}

// ============================================================================
// Initialisation
// ============================================================================

#[test]
fn init_boots_engine_and_loads_first_model() {
    let bundle = ModelBundle::new("Haru");
    let (widget, fixture) = init_widget(&bundle, fixed());

    assert_eq!(fixture.engine.calls.start_ups.get(), 1);
    assert_eq!(fixture.reader.request_count(CORE_SCRIPT), 1);
    assert_eq!(widget.load_status(), Some(LoadStatus::Ready));
    assert_eq!(widget.size(), (280, 360));
}

#[test]
fn started_engine_is_not_booted_again() {
    let bundle = ModelBundle::new("Haru");
    let reader = bundle_reader(&bundle);
    let engine = Rc::new(TestEngine::new());
    engine.start_up(b"core").expect("boots");

    let config = test_config(&["Haru"]);
    let widget = block_on(Widget::init(config, platform(&reader, &engine, TestSurface::new())));
    assert!(widget.is_ok());
    assert_eq!(engine.calls.start_ups.get(), 1);
    assert_eq!(reader.request_count(CORE_SCRIPT), 0);
}

#[test]
fn missing_render_context_fails_init() {
    let bundle = ModelBundle::new("Haru");
    let reader = bundle_reader(&bundle);
    let engine = Rc::new(TestEngine::new());

    let result = block_on(Widget::init(
        test_config(&["Haru"]),
        platform(&reader, &engine, TestSurface::unavailable()),
    ));
    assert!(matches!(result, Err(WidgetError::RenderContext(_))));
    // Nothing else was attempted.
    assert_eq!(engine.calls.start_ups.get(), 0);
    assert!(reader.requests().is_empty());
}

#[test]
fn rejected_bootstrap_fails_init() {
    let bundle = ModelBundle::new("Haru");
    let reader = bundle_reader(&bundle);
    let engine = Rc::new(TestEngine::rejecting_bootstrap());

    let result = block_on(Widget::init(
        test_config(&["Haru"]),
        platform(&reader, &engine, TestSurface::new()),
    ));
    assert!(matches!(result, Err(WidgetError::Bootstrap(_))));
    assert_eq!(reader.requests(), vec![CORE_SCRIPT.to_string()]);
}

#[test]
fn missing_bootstrap_file_fails_init() {
    let reader = Rc::new(BundleReader::new());
    let engine = Rc::new(TestEngine::new());

    let result = block_on(Widget::init(
        test_config(&["Haru"]),
        platform(&reader, &engine, TestSurface::new()),
    ));
    assert!(matches!(result, Err(WidgetError::Bootstrap(_))));
}

#[test]
fn invalid_config_fails_init() {
    let reader = bundle_reader(&ModelBundle::new("Haru"));
    let engine = Rc::new(TestEngine::new());

    let result = block_on(Widget::init(
        test_config(&[]),
        platform(&reader, &engine, TestSurface::new()),
    ));
    assert!(matches!(result, Err(WidgetError::Config(_))));

    let mut config = test_config(&["Haru"]);
    config.scale = 0.0;
    let result = block_on(Widget::init(config, platform(&reader, &engine, TestSurface::new())));
    assert!(matches!(result, Err(WidgetError::Config(_))));
}

#[test]
fn failed_model_load_does_not_fail_init() {
    let bundle = ModelBundle::new("Haru").without_moc();
    let (widget, _fixture) = init_widget(&bundle, fixed());

    assert!(matches!(widget.load_status(), Some(LoadStatus::Failed(_))));
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn tick_clears_updates_and_draws() {
    let (mut widget, fixture) = init_widget(&ModelBundle::new("Haru"), fixed());

    for _ in 0..3 {
        let report = widget.tick(1.0 / 30.0).expect("model active");
        assert!(report.composed);
    }
    assert_eq!(fixture.surface.frames.get(), 3);
    assert_eq!(fixture.engine.calls.draws.borrow().len(), 3);

    assert!(widget.frame().is_some());
    assert_eq!(fixture.surface.frames.get(), 4);
}

#[test]
fn scene_switch_loads_the_next_model() {
    let haru = ModelBundle::new("Haru");
    let reader = bundle_reader(&haru);
    let mao = ModelBundle::new("Mao");
    mao.install(&reader.files);
    let engine = Rc::new(TestEngine::new());

    let config = test_config(&["Haru", "Mao"]);
    let mut widget =
        block_on(Widget::init(config, platform(&reader, &engine, TestSurface::new()))).expect("widget initialises");
    widget.settle();

    assert!(widget.next_scene().is_some());
    assert!(matches!(widget.load_status(), Some(LoadStatus::Loading { .. })));
    widget.settle();
    assert_eq!(widget.load_status(), Some(LoadStatus::Ready));
    assert_eq!(widget.scene().scene_index(), 1);
    assert_eq!(widget.scene().model_count(), 1);
}

// ============================================================================
// Pointer Input
// ============================================================================

#[test]
fn tap_at_canvas_centre_emits_hit_area() {
    let bundle = ModelBundle::new("Haru").with_hit_area("Body", [-1.0, 1.0, 1.0, -1.0]);
    let (mut widget, _fixture) = init_widget(&bundle, fixed());

    let taps = Rc::new(Cell::new(0));
    let counter = taps.clone();
    let listener = widget.on(HitArea::Body, move || counter.set(counter.get() + 1));

    widget.pointer_down(140.0, 180.0);
    assert_eq!(widget.pointer_up(140.0, 180.0), Some(HitArea::Body));
    assert_eq!(taps.get(), 1);

    assert!(widget.off(listener));
    widget.pointer_down(140.0, 180.0);
    assert_eq!(widget.pointer_up(140.0, 180.0), Some(HitArea::Body));
    assert_eq!(taps.get(), 1);
}

#[test]
fn tap_outside_the_model_emits_nothing() {
    let bundle = ModelBundle::new("Haru").with_hit_area("Body", [-0.2, 0.2, 0.2, -0.2]);
    let (mut widget, _fixture) = init_widget(&bundle, fixed());

    widget.pointer_down(0.0, 0.0);
    assert_eq!(widget.pointer_up(0.0, 0.0), None);
}

#[test]
fn drag_follows_the_pointer_and_resets_on_release() {
    let (mut widget, _fixture) = init_widget(&ModelBundle::new("Haru"), fixed());

    // Right edge of a 280 wide canvas.
    widget.pointer_down(140.0, 180.0);
    widget.pointer_move(280.0, 180.0);
    for _ in 0..30 {
        widget.tick(1.0 / 30.0);
    }
    let (x, _) = widget.scene().current_model().unwrap().drag_offset();
    assert!(x > 0.3);

    widget.pointer_up(280.0, 180.0);
    for _ in 0..60 {
        widget.tick(1.0 / 30.0);
    }
    let (x, _) = widget.scene().current_model().unwrap().drag_offset();
    assert!(x.abs() < 0.05);
}

// ============================================================================
// Resize and Release
// ============================================================================

#[test]
fn resize_only_applies_to_auto_canvas() {
    let (mut widget, fixture) = init_widget(&ModelBundle::new("Haru"), fixed());
    fixture.surface.host_size.set((1024, 768));
    assert!(!widget.resize());
    assert_eq!(widget.size(), (280, 360));

    let (mut widget, fixture) = init_widget(&ModelBundle::new("Haru"), CanvasMode::AUTO);
    assert_eq!(widget.size(), (800, 600));
    fixture.surface.host_size.set((1024, 768));
    assert!(widget.resize());
    assert_eq!(widget.size(), (1024, 768));
    assert_eq!(widget.view().size(), (1024.0, 768.0));
}

#[test]
fn release_is_idempotent() {
    let (mut widget, fixture) = init_widget(&ModelBundle::new("Haru"), fixed());

    assert!(widget.release());
    assert!(widget.is_released());
    assert!(!widget.release());

    assert_eq!(fixture.engine.calls.disposals.get(), 1);
    assert!(fixture.surface.released.get());
    assert_eq!(widget.scene().model_count(), 0);
    assert!(widget.tick(1.0 / 30.0).is_none());
}
