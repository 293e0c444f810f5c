//! Frame Compositor Tests
//!
//! Tests for:
//! - Idle fallback when the primary layer empties
//! - Eye blink running only on frames without motion output on any layer
//! - Lip-sync from analysed voice samples
//! - Physics, expression and drag layers
//! - Models that have not finished loading

mod common;

use common::*;

use live2d_widget::animation::{ClipSlot, Priority};
use live2d_widget::model::{FrameReport, ModelHandle, MotionLayer};

const ARM: &str = "ParamArmLA";
const MOUTH: &str = "ParamMouthOpenY";

fn loaded(bundle: &ModelBundle, lip_sync: bool) -> (SceneHarness<BundleReader>, ModelHandle) {
    let reader = BundleReader::new();
    bundle.install(&reader.files);
    let mut config = test_config(&[bundle.name.as_str()]);
    config.lip_sync = lip_sync;
    let mut h = scene_harness(reader, &config);
    let handle = h.scene.change_scene(0, &h.loader).expect("model configured");
    h.settle();
    assert!(h.scene.model(handle).unwrap().is_ready());
    (h, handle)
}

fn param(h: &SceneHarness<BundleReader>, handle: ModelHandle, id: &str) -> f32 {
    h.scene
        .model(handle)
        .and_then(|m| m.core())
        .map(|core| core.parameter_value(id))
        .expect("core model loaded")
}

// ============================================================================
// Idle and Blink
// ============================================================================

#[test]
fn idle_motion_starts_when_nothing_plays() {
    let bundle = ModelBundle::new("Haru")
        .with_motion("Idle", motion_json(1.0, false, &[(ARM, 3.0)]))
        .with_eye_blink(&["ParamEyeLOpen"]);
    let (mut h, handle) = loaded(&bundle, true);
    let model = h.scene.model_mut(handle).unwrap();

    let first = model.update(0.5, &h.loader);
    assert!(first.composed);
    assert!(first.idle_started);
    assert!(!first.motion_updated);
    assert!(first.blink_applied);
    assert_eq!(
        model.motion_manager(MotionLayer::Primary).playing_key(),
        Some("Idle_0")
    );

    let second = model.update(0.5, &h.loader);
    assert!(second.motion_updated);
    assert!(!second.blink_applied);
    assert!(!second.idle_started);
    assert!(approx(param(&h, handle, ARM), 3.0));

    // Runs until its end at 1.5 s of manager time, then the layer empties.
    let model = h.scene.model_mut(handle).unwrap();
    assert!(model.update(0.5, &h.loader).motion_updated);
    assert!(model.update(0.5, &h.loader).motion_updated);
    assert!(model.motion_manager(MotionLayer::Primary).is_finished());

    let again = model.update(0.5, &h.loader);
    assert!(again.idle_started);
    assert!(again.blink_applied);
}

#[test]
fn model_without_idle_group_keeps_blinking() {
    let bundle = ModelBundle::new("Haru").with_eye_blink(&["ParamEyeLOpen", "ParamEyeROpen"]);
    let (mut h, handle) = loaded(&bundle, true);
    let model = h.scene.model_mut(handle).unwrap();

    for _ in 0..3 {
        let report = model.update(1.0 / 30.0, &h.loader);
        assert!(report.idle_started);
        assert!(report.blink_applied);
        assert!(!report.motion_updated);
    }
    assert!(model.motion_manager(MotionLayer::Primary).is_finished());
}

#[test]
fn limb_motion_alone_suppresses_blink() {
    let bundle = ModelBundle::new("Haru")
        .with_motion("TapLeft", motion_json(2.0, false, &[(ARM, 2.0)]))
        .with_eye_blink(&["ParamEyeLOpen"]);
    let (mut h, handle) = loaded(&bundle, true);
    let model = h.scene.model_mut(handle).unwrap();

    assert!(
        model
            .start_random_left_hand_motion("TapLeft", Priority::Normal, None, &h.loader)
            .is_some()
    );
    // Keeps the primary layer busy without it writing anything: the clip
    // is not in the cache, so the entry is dropped during this frame.
    model
        .motion_manager_mut(MotionLayer::Primary)
        .start_motion(ClipSlot::Pending("Remote_0".into()), "Remote_0", true, None);

    let report = model.update(0.1, &h.loader);
    assert!(!report.idle_started);
    assert!(report.motion_updated);
    assert!(!report.blink_applied);
    assert!(approx(param(&h, handle, ARM), 2.0));

    let model = h.scene.model(handle).unwrap();
    assert!(model.motion_manager(MotionLayer::Primary).is_finished());
    assert!(!model.motion_manager(MotionLayer::LeftArm).is_finished());
}

// ============================================================================
// Lip-sync
// ============================================================================

fn lip_sync_bundle() -> ModelBundle {
    ModelBundle::new("Mao").with_lip_sync(&[MOUTH])
}

#[test]
fn lip_sync_follows_voice_loudness() {
    let (mut h, handle) = loaded(&lip_sync_bundle(), true);
    let model = h.scene.model_mut(handle).unwrap();
    model
        .wav_mut()
        .load_bytes(&wav_pcm16(1, 1000, &[16384; 1000]))
        .expect("valid wav");

    let report = model.update(0.1, &h.loader);
    let expected = pcm16_value(16384);
    let value = report.lip_sync_value.expect("lip-sync enabled");
    assert!(approx(value, expected));
    assert!(approx(param(&h, handle, MOUTH), expected * 0.8));

    // The mouth is rebuilt from the snapshot every frame, not accumulated.
    let model = h.scene.model_mut(handle).unwrap();
    model.update(0.1, &h.loader);
    assert!(approx(param(&h, handle, MOUTH), expected * 0.8));
}

#[test]
fn silence_keeps_the_mouth_closed() {
    let (mut h, handle) = loaded(&lip_sync_bundle(), true);
    let model = h.scene.model_mut(handle).unwrap();

    let report = model.update(0.1, &h.loader);
    assert_eq!(report.lip_sync_value, Some(0.0));
    assert!(approx(param(&h, handle, MOUTH), 0.0));
}

#[test]
fn disabled_lip_sync_reports_nothing() {
    let (mut h, handle) = loaded(&lip_sync_bundle(), false);
    let model = h.scene.model_mut(handle).unwrap();
    model
        .wav_mut()
        .load_bytes(&wav_pcm16(1, 1000, &[16384; 1000]))
        .expect("valid wav");

    let report = model.update(0.1, &h.loader);
    assert_eq!(report.lip_sync_value, None);
    assert!(approx(param(&h, handle, MOUTH), 0.0));
}

// ============================================================================
// Physics, Expression, Drag
// ============================================================================

#[test]
fn physics_runs_every_frame() {
    let bundle = ModelBundle::new("Hiyori").with_physics();
    let (mut h, handle) = loaded(&bundle, true);
    let model = h.scene.model_mut(handle).unwrap();
    assert!(model.has_physics());

    for _ in 0..3 {
        model.update(1.0 / 60.0, &h.loader);
    }
    assert_eq!(h.engine.calls.physics_evaluations.get(), 3);
    assert!(approx(param(&h, handle, PARAM_HAIR), 0.25));
}

#[test]
fn expression_overlay_is_stable_across_frames() {
    let bundle = ModelBundle::new("Haru").with_expression("smile", expression_json(&[("ParamMouthForm", 1.0)]));
    let (mut h, handle) = loaded(&bundle, true);
    let model = h.scene.model_mut(handle).unwrap();
    assert!(model.set_expression("smile").is_some());

    for _ in 0..4 {
        let model = h.scene.model_mut(handle).unwrap();
        model.update(1.0 / 30.0, &h.loader);
        assert!(approx(param(&h, handle, "ParamMouthForm"), 1.0));
    }
}

#[test]
fn drag_turns_the_eyes_towards_the_pointer() {
    let (mut h, handle) = loaded(&ModelBundle::new("Haru"), true);
    let model = h.scene.model_mut(handle).unwrap();
    model.set_dragging(1.0, 0.0);

    for _ in 0..60 {
        model.update(1.0 / 30.0, &h.loader);
    }
    let (drag_x, drag_y) = model.drag_offset();
    assert!(drag_x > 0.5);
    assert!(approx(drag_y, 0.0));
    assert!(approx(param(&h, handle, "ParamEyeBallX"), drag_x));
}

#[test]
fn breath_moves_the_chest_parameter() {
    let (mut h, handle) = loaded(&ModelBundle::new("Haru"), true);
    let model = h.scene.model_mut(handle).unwrap();

    model.update(0.0, &h.loader);
    // sin(0) leaves only the 0.5 offset.
    assert!(approx(param(&h, handle, "ParamBreath"), 0.5));
}

// ============================================================================
// Unloaded Models
// ============================================================================

#[test]
fn loading_model_reports_nothing() {
    let bundle = ModelBundle::new("Haru").with_motion("Idle", motion_json(1.0, false, &[(ARM, 3.0)]));
    let reader = ManualReader::new();
    bundle.install(&reader.files);
    let mut h = scene_harness(reader, &test_config(&["Haru"]));
    let handle = h.scene.change_scene(0, &h.loader).unwrap();

    let model = h.scene.model_mut(handle).unwrap();
    let report = model.update(1.0 / 30.0, &h.loader);
    assert_eq!(report, FrameReport::default());
    assert!(model.motion_manager(MotionLayer::Primary).is_finished());
    assert!(model.core().is_none());
}
