//! Widget configuration.
//!
//! The host hands the widget a JSON options object (or builds [`WidgetConfig`]
//! directly). Every field except `source` is optional:
//!
//! ```json
//! {
//!   "canvas": { "width": 280, "height": 360 },
//!   "scale": 1.0,
//!   "debug": false,
//!   "source": { "path": "/live2d/models", "models": ["Haru", "Hiyori"] },
//!   "cubismCorePath": "/live2d/core/live2dCubismCore.min.js",
//!   "stageTimeoutSecs": 30.0,
//!   "lipSync": true
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, WidgetError};

/// Upper bound of the view zoom.
pub const VIEW_SCALE_MAX: f32 = 2.0;
/// Lower bound of the view zoom.
pub const VIEW_SCALE_MIN: f32 = 0.8;

/// Logical view extent (±1 vertically, aspect-scaled horizontally).
pub const VIEW_LOGICAL_LEFT: f32 = -1.0;
pub const VIEW_LOGICAL_RIGHT: f32 = 1.0;
pub const VIEW_LOGICAL_BOTTOM: f32 = -1.0;
pub const VIEW_LOGICAL_TOP: f32 = 1.0;

/// Largest logical rectangle the view may be panned over.
pub const VIEW_LOGICAL_MAX_LEFT: f32 = -2.0;
pub const VIEW_LOGICAL_MAX_RIGHT: f32 = 2.0;
pub const VIEW_LOGICAL_MAX_BOTTOM: f32 = -2.0;
pub const VIEW_LOGICAL_MAX_TOP: f32 = 2.0;

pub const DEFAULT_CORE_PATH: &str = "/live2d/core/live2dCubismCore.min.js";
pub const DEFAULT_STAGE_TIMEOUT_SECS: f32 = 30.0;

/// Canvas sizing mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanvasMode {
    Fixed { width: u32, height: u32 },
    Auto(AutoTag),
}

/// The literal string `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoTag {
    Auto,
}

impl CanvasMode {
    pub const AUTO: CanvasMode = CanvasMode::Auto(AutoTag::Auto);

    #[must_use]
    pub fn is_auto(&self) -> bool {
        matches!(self, CanvasMode::Auto(_))
    }
}

impl Default for CanvasMode {
    fn default() -> Self {
        CanvasMode::Fixed {
            width: 280,
            height: 360,
        }
    }
}

/// Where the model bundles live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base path or URL that holds one directory per model.
    #[serde(default)]
    pub path: String,
    /// Model directory names; each directory holds `<name>.model3.json`.
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub canvas: CanvasMode,
    pub scale: f32,
    pub debug: bool,
    pub source: SourceConfig,
    pub cubism_core_path: String,
    /// Seconds a single load stage may wait before the model is marked failed.
    pub stage_timeout_secs: f32,
    pub lip_sync: bool,
    /// Fixed seed for motion, expression and blink randomness.
    pub seed: Option<u64>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasMode::default(),
            scale: 1.0,
            debug: false,
            source: SourceConfig::default(),
            cubism_core_path: DEFAULT_CORE_PATH.to_string(),
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            lip_sync: true,
            seed: None,
        }
    }
}

impl WidgetConfig {
    /// Shorthand for a config pointing at `path` with the given model list.
    pub fn with_source(path: impl Into<String>, models: &[&str]) -> Self {
        Self {
            source: SourceConfig {
                path: path.into(),
                models: models.iter().map(|m| (*m).to_string()).collect(),
            },
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects configurations the widget cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.source.models.is_empty() {
            return Err(WidgetError::Config("source.models is empty".into()));
        }
        if !(self.scale > 0.0) {
            return Err(WidgetError::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !(self.stage_timeout_secs > 0.0) {
            return Err(WidgetError::Config(format!(
                "stageTimeoutSecs must be positive, got {}",
                self.stage_timeout_secs
            )));
        }
        if let CanvasMode::Fixed { width, height } = self.canvas {
            if width == 0 || height == 0 {
                return Err(WidgetError::Config(format!(
                    "fixed canvas must be non-zero, got {width}x{height}"
                )));
            }
        }
        Ok(())
    }
}
