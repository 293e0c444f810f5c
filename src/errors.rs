//! Error Types
//!
//! This module defines the error types used throughout the widget.
//!
//! # Overview
//!
//! The main error type [`WidgetError`] covers all failure modes including:
//! - Asset fetch failures (file, HTTP, in-memory)
//! - Manifest, motion and texture parsing errors
//! - Load state machine failures (missing model file, stage timeout)
//! - Malformed WAV data used for lip-sync
//! - Host failures (render surface, engine bootstrap, configuration)
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, WidgetError>`.
//!
//! ```rust,ignore
//! use live2d_widget::errors::{WidgetError, Result};
//!
//! fn load_asset() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::model::LoadStage;

/// The main error type for the widget.
#[derive(Error, Debug)]
pub enum WidgetError {
    // ========================================================================
    // Asset Fetch Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The fetch for an asset failed for a transport reason.
    #[error("Failed to fetch '{path}': {reason}")]
    FetchFailed {
        /// Resolved asset path
        path: String,
        /// Transport-level description
        reason: String,
    },

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
    },

    /// URL parsing error.
    #[cfg(feature = "http")]
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error (model3 / motion3 / exp3 / pose3 / userdata3).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Asset bytes were fetched but could not be interpreted.
    #[error("Invalid asset '{path}': {reason}")]
    InvalidAsset {
        /// Resolved asset path
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// WAV decoding error.
    #[error("WAV error: {0}")]
    Wav(#[from] WavError),

    // ========================================================================
    // Load State Machine Errors
    // ========================================================================
    /// The manifest does not name a model mesh file.
    #[error("Model data does not exist in manifest '{0}'")]
    MissingModelFile(String),

    /// A load stage did not resolve within the configured timeout.
    #[error("Load stage {stage:?} timed out after {seconds:.1}s")]
    LoadTimeout {
        /// Stage that stalled
        stage: LoadStage,
        /// Seconds spent in the stage
        seconds: f32,
    },

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// The rendering surface could not be acquired.
    #[error("Cannot initialize rendering context: {0}")]
    RenderContext(String),

    /// The animation engine bootstrap failed.
    #[error("Animation engine bootstrap failed: {0}")]
    Bootstrap(String),

    /// Invalid widget configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Task join error (when the IO runtime fails to complete a read).
    #[error("Task join error: {0}")]
    TaskJoinError(String),
}

/// Reasons a WAV byte stream is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavError {
    #[error("file too short ({0} bytes)")]
    TooShort(usize),

    #[error("cannot find signature \"{0}\"")]
    MissingSignature(&'static str),

    #[error("cannot find \"data\" chunk")]
    MissingDataChunk,

    #[error("file is not linear PCM (format {0})")]
    NotLinearPcm(u16),

    #[error("unsupported bits per sample: {0}")]
    UnsupportedBitDepth(u16),

    #[error("no channels declared")]
    NoChannels,

    #[error("sample data truncated")]
    Truncated,
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for WidgetError {
    fn from(err: image::ImageError) -> Self {
        WidgetError::ImageDecodeError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WidgetError {
    fn from(err: tokio::task::JoinError) -> Self {
        WidgetError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, WidgetError>`.
pub type Result<T> = std::result::Result<T, WidgetError>;
