#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod audio;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod input;
pub mod model;
pub mod scene;
pub mod utils;
pub mod widget;

pub use animation::{ExpressionClip, MotionClip, MotionHandle, MotionManager, Priority};
pub use assets::{AssetLoader, AssetReader, FileAssetReader, MemoryAssetReader};
pub use audio::{AudioPlayer, SilentAudioPlayer, WavFileHandler};
pub use config::{CanvasMode, SourceConfig, WidgetConfig};
pub use engine::{CoreModel, ModelEngine, ModelRenderer, ParameterModel, PhysicsRig, RenderSurface};
pub use errors::{Result, WidgetError};
pub use events::{EventEmitter, HitArea, ListenerId};
pub use model::{FrameReport, LoadStage, LoadStatus, ModelHandle, ModelInstance};
pub use scene::SceneManager;
pub use widget::{Platform, Widget};
