use serde::Deserialize;

use crate::animation::Motion;
use crate::engine::CoreModel;
use crate::errors::Result;

const DEFAULT_FADE_TIME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum ExpressionBlend {
    #[default]
    Add,
    Multiply,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionParameter {
    pub id: String,
    pub value: f32,
    #[serde(default)]
    pub blend: ExpressionBlend,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExpressionJson {
    fade_in_time: Option<f32>,
    fade_out_time: Option<f32>,
    #[serde(default)]
    parameters: Vec<ExpressionParameter>,
}

/// A parsed exp3.json overlay. Expressions never finish on their own; they
/// are replaced by the next expression.
#[derive(Debug, Clone)]
pub struct ExpressionClip {
    pub fade_in_time: f32,
    pub fade_out_time: f32,
    pub parameters: Vec<ExpressionParameter>,
}

impl ExpressionClip {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let json: ExpressionJson = serde_json::from_slice(bytes)?;
        Ok(Self {
            fade_in_time: json
                .fade_in_time
                .filter(|t| *t >= 0.0)
                .unwrap_or(DEFAULT_FADE_TIME),
            fade_out_time: json
                .fade_out_time
                .filter(|t| *t >= 0.0)
                .unwrap_or(DEFAULT_FADE_TIME),
            parameters: json.parameters,
        })
    }
}

impl Motion for ExpressionClip {
    fn duration(&self) -> Option<f32> {
        None
    }

    fn is_loop(&self) -> bool {
        false
    }

    fn fade_in_time(&self) -> f32 {
        self.fade_in_time
    }

    fn fade_out_time(&self) -> f32 {
        self.fade_out_time
    }

    fn apply(&self, model: &mut dyn CoreModel, _time: f32, weight: f32) {
        for param in &self.parameters {
            match param.blend {
                ExpressionBlend::Add => model.add_parameter_value(&param.id, param.value, weight),
                ExpressionBlend::Multiply => {
                    model.multiply_parameter_value(&param.id, param.value, weight);
                }
                ExpressionBlend::Overwrite => {
                    model.set_parameter_value(&param.id, param.value, weight);
                }
            }
        }
    }
}
