use serde::Deserialize;

use crate::animation::Motion;
use crate::animation::curve::SegmentCurve;
use crate::engine::CoreModel;
use crate::errors::Result;
use crate::utils::easing_sine;

const TARGET_MODEL: &str = "Model";
const TARGET_PARAMETER: &str = "Parameter";
const TARGET_PART_OPACITY: &str = "PartOpacity";
const ID_EYE_BLINK: &str = "EyeBlink";
const ID_LIP_SYNC: &str = "LipSync";

const DEFAULT_FADE_TIME: f32 = 1.0;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MotionJson {
    meta: MotionMetaJson,
    #[serde(default)]
    curves: Vec<CurveJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MotionMetaJson {
    duration: f32,
    #[serde(default)]
    r#loop: bool,
    fade_in_time: Option<f32>,
    fade_out_time: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CurveJson {
    target: String,
    id: String,
    fade_in_time: Option<f32>,
    fade_out_time: Option<f32>,
    segments: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveTarget {
    Model,
    Parameter,
    PartOpacity,
}

#[derive(Debug, Clone)]
pub struct MotionCurve {
    pub target: CurveTarget,
    pub id: String,
    /// Per-curve fades override the clip-level fade weight.
    pub fade_in_time: Option<f32>,
    pub fade_out_time: Option<f32>,
    pub curve: SegmentCurve,
}

/// A parsed motion3.json clip.
#[derive(Debug, Clone)]
pub struct MotionClip {
    pub duration: f32,
    pub looping: bool,
    pub fade_in_time: f32,
    pub fade_out_time: f32,
    pub curves: Vec<MotionCurve>,
    eye_blink_ids: Vec<String>,
    lip_sync_ids: Vec<String>,
}

impl MotionClip {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let json: MotionJson = serde_json::from_slice(bytes)?;

        let mut curves = Vec::with_capacity(json.curves.len());
        for curve in json.curves {
            let target = match curve.target.as_str() {
                TARGET_MODEL => CurveTarget::Model,
                TARGET_PARAMETER => CurveTarget::Parameter,
                TARGET_PART_OPACITY => CurveTarget::PartOpacity,
                other => {
                    log::warn!("Skipping motion curve '{}' with unknown target '{other}'", curve.id);
                    continue;
                }
            };
            curves.push(MotionCurve {
                target,
                id: curve.id,
                fade_in_time: curve.fade_in_time.filter(|t| *t >= 0.0),
                fade_out_time: curve.fade_out_time.filter(|t| *t >= 0.0),
                curve: SegmentCurve::parse(&curve.segments)?,
            });
        }

        Ok(Self {
            duration: json.meta.duration,
            looping: json.meta.r#loop,
            fade_in_time: json
                .meta
                .fade_in_time
                .filter(|t| *t >= 0.0)
                .unwrap_or(DEFAULT_FADE_TIME),
            fade_out_time: json
                .meta
                .fade_out_time
                .filter(|t| *t >= 0.0)
                .unwrap_or(DEFAULT_FADE_TIME),
            curves,
            eye_blink_ids: Vec::new(),
            lip_sync_ids: Vec::new(),
        })
    }

    /// Applies manifest fade overrides; negative values mean "keep the clip's".
    pub fn apply_fade_overrides(&mut self, fade_in: f32, fade_out: f32) {
        if fade_in >= 0.0 {
            self.fade_in_time = fade_in;
        }
        if fade_out >= 0.0 {
            self.fade_out_time = fade_out;
        }
    }

    /// Binds the parameters driven by the clip's `EyeBlink`/`LipSync` curves.
    pub fn set_effect_ids(&mut self, eye_blink_ids: &[String], lip_sync_ids: &[String]) {
        self.eye_blink_ids = eye_blink_ids.to_vec();
        self.lip_sync_ids = lip_sync_ids.to_vec();
    }

    fn model_curve(&self, id: &str) -> Option<&MotionCurve> {
        self.curves
            .iter()
            .find(|c| c.target == CurveTarget::Model && c.id == id)
    }

    fn has_parameter_curve(&self, id: &str) -> bool {
        self.curves
            .iter()
            .any(|c| c.target == CurveTarget::Parameter && c.id == id)
    }

    fn curve_weight(&self, curve: &MotionCurve, time: f32, weight: f32) -> f32 {
        if curve.fade_in_time.is_none() && curve.fade_out_time.is_none() {
            return weight;
        }
        let fade_in = match curve.fade_in_time {
            Some(t) if t > 0.0 => easing_sine(time / t),
            _ => 1.0,
        };
        let fade_out = match curve.fade_out_time {
            Some(t) if t > 0.0 && self.duration > 0.0 && !self.looping => {
                easing_sine((self.duration - time) / t)
            }
            _ => 1.0,
        };
        fade_in * fade_out
    }
}

impl Motion for MotionClip {
    fn duration(&self) -> Option<f32> {
        (!self.looping && self.duration > 0.0).then_some(self.duration)
    }

    fn is_loop(&self) -> bool {
        self.looping
    }

    fn fade_in_time(&self) -> f32 {
        self.fade_in_time
    }

    fn fade_out_time(&self) -> f32 {
        self.fade_out_time
    }

    fn apply(&self, model: &mut dyn CoreModel, time: f32, weight: f32) {
        let time = if self.looping && self.duration > 0.0 {
            time % self.duration
        } else {
            time
        };

        let eye_blink = self.model_curve(ID_EYE_BLINK).map(|c| c.curve.evaluate(time));
        let lip_sync = self.model_curve(ID_LIP_SYNC).map(|c| c.curve.evaluate(time));

        for curve in &self.curves {
            match curve.target {
                CurveTarget::Model => {}
                CurveTarget::Parameter => {
                    let mut value = curve.curve.evaluate(time);
                    if let Some(blink) = eye_blink {
                        if self.eye_blink_ids.iter().any(|id| *id == curve.id) {
                            value *= blink;
                        }
                    }
                    if let Some(lip) = lip_sync {
                        if self.lip_sync_ids.iter().any(|id| *id == curve.id) {
                            value += lip;
                        }
                    }
                    let w = self.curve_weight(curve, time, weight);
                    model.set_parameter_value(&curve.id, value, w);
                }
                CurveTarget::PartOpacity => {
                    model.set_part_opacity(&curve.id, curve.curve.evaluate(time));
                }
            }
        }

        // Effect parameters without their own curve follow the effect curve.
        if let Some(blink) = eye_blink {
            for id in &self.eye_blink_ids {
                if !self.has_parameter_curve(id) {
                    let value = model.parameter_value(id) * blink;
                    model.set_parameter_value(id, value, weight);
                }
            }
        }
        if let Some(lip) = lip_sync {
            for id in &self.lip_sync_ids {
                if !self.has_parameter_curve(id) {
                    let value = model.parameter_value(id) + lip;
                    model.set_parameter_value(id, value, weight);
                }
            }
        }
    }
}
