//! Voice playback and lip-sync analysis.

pub mod wav;

pub use wav::{WavData, WavFileHandler};

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::errors::Result;

/// Host audio output.
pub trait AudioPlayer {
    /// Starts playing the sound at `path`; resolves when playback has begun.
    fn play(&self, path: &str) -> LocalBoxFuture<'static, Result<()>>;

    fn stop(&self);
}

/// Audio output for hosts without sound. Lip-sync analysis still runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudioPlayer;

impl AudioPlayer for SilentAudioPlayer {
    fn play(&self, path: &str) -> LocalBoxFuture<'static, Result<()>> {
        log::debug!("Silent playback of '{path}'");
        futures::future::ready(Ok(())).boxed_local()
    }

    fn stop(&self) {}
}
