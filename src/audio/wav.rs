use std::rc::Rc;

use crate::assets::{AssetLoader, AssetRequest, FetchTicket};
use crate::audio::AudioPlayer;
use crate::errors::WavError;
use crate::model::ModelHandle;

/// Decoded linear PCM, one `Vec` per channel, samples in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WavData {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub samples_per_channel: usize,
    pub pcm: Vec<Vec<f32>>,
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], WavError> {
        let end = self.offset + N;
        let slice = self.bytes.get(self.offset..end).ok_or(WavError::Truncated)?;
        self.offset = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, WavError> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, WavError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u24(&mut self) -> Result<u32, WavError> {
        let [a, b, c] = self.take::<3>()?;
        Ok(u32::from_le_bytes([a, b, c, 0]))
    }

    fn u32(&mut self) -> Result<u32, WavError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn signature(&mut self, expected: &'static str) -> Result<bool, WavError> {
        let sig = self.take::<4>()?;
        Ok(sig == expected.as_bytes())
    }

    fn skip(&mut self, n: usize) {
        self.offset = self.offset.saturating_add(n);
    }

    fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// One sample widened to 32 bits and scaled into `[-1, 1]`.
    fn sample(&mut self, bits: u16) -> Result<f32, WavError> {
        let pcm32: i32 = match bits {
            8 => (i32::from(self.u8()?) - 128) << 24,
            16 => i32::from(self.u16()? as i16) << 16,
            24 => (self.u24()? << 8) as i32,
            other => return Err(WavError::UnsupportedBitDepth(other)),
        };
        Ok(pcm32 as f32 / 2_147_483_647.0)
    }
}

impl WavData {
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < 4 {
            return Err(WavError::TooShort(bytes.len()));
        }
        let mut r = ByteReader::new(bytes);

        if !r.signature("RIFF")? {
            return Err(WavError::MissingSignature("RIFF"));
        }
        r.u32()?; // file size - 8
        if !r.signature("WAVE")? {
            return Err(WavError::MissingSignature("WAVE"));
        }
        if !r.signature("fmt ")? {
            return Err(WavError::MissingSignature("fmt "));
        }
        let fmt_size = r.u32()? as usize;
        let format = r.u16()?;
        if format != 1 {
            return Err(WavError::NotLinearPcm(format));
        }
        let channels = r.u16()?;
        if channels == 0 {
            return Err(WavError::NoChannels);
        }
        let sample_rate = r.u32()?;
        r.u32()?; // bytes per second
        r.u16()?; // block align
        let bits_per_sample = r.u16()?;
        if !matches!(bits_per_sample, 8 | 16 | 24) {
            return Err(WavError::UnsupportedBitDepth(bits_per_sample));
        }
        if fmt_size > 16 {
            r.skip(fmt_size - 16);
        }

        // Skip chunks until "data".
        loop {
            if r.at_end() {
                return Err(WavError::MissingDataChunk);
            }
            let is_data = r.signature("data").map_err(|_| WavError::MissingDataChunk)?;
            if is_data {
                break;
            }
            let size = r.u32().map_err(|_| WavError::MissingDataChunk)? as usize;
            r.skip(size);
        }

        let data_size = r.u32()? as usize;
        if data_size > bytes.len().saturating_sub(r.offset) {
            return Err(WavError::Truncated);
        }
        let samples_per_channel =
            data_size * 8 / (usize::from(bits_per_sample) * usize::from(channels));

        let mut pcm = vec![Vec::with_capacity(samples_per_channel); usize::from(channels)];
        for _ in 0..samples_per_channel {
            for channel in &mut pcm {
                channel.push(r.sample(bits_per_sample)?);
            }
        }

        Ok(Self {
            channels,
            sample_rate,
            bits_per_sample,
            samples_per_channel,
            pcm,
        })
    }
}

/// Plays voice lines and measures their loudness for lip-sync.
///
/// Each [`WavFileHandler::update`] consumes the samples that elapsed since the
/// previous call and stores their RMS.
#[derive(Default)]
pub struct WavFileHandler {
    data: Option<WavData>,
    user_time: f32,
    last_rms: f32,
    sample_offset: usize,
    generation: u64,
    player: Option<Rc<dyn AudioPlayer>>,
}

impl WavFileHandler {
    #[must_use]
    pub fn new(player: Option<Rc<dyn AudioPlayer>>) -> Self {
        Self {
            player,
            ..Self::default()
        }
    }

    /// Starts playback of `path` and fetches its samples for analysis.
    ///
    /// Playback is fire-and-forget: failures are logged by the loader.
    pub fn start(&mut self, path: &str, model: ModelHandle, loader: &AssetLoader) {
        self.reset();
        self.data = None;
        self.generation += 1;

        if let Some(player) = &self.player {
            loader.spawn_detached(&format!("Voice playback '{path}'"), player.play(path));
        }
        loader.fetch(
            FetchTicket {
                model,
                request: AssetRequest::Voice {
                    generation: self.generation,
                },
            },
            path.to_string(),
        );
    }

    /// Accepts fetched voice bytes if they belong to the latest `start`.
    pub fn on_loaded(&mut self, generation: u64, bytes: &[u8]) -> Result<(), WavError> {
        if generation != self.generation {
            log::debug!("Ignoring superseded voice data");
            return Ok(());
        }
        self.load_bytes(bytes)
    }

    /// Replaces the analysed data, resetting playback position.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), WavError> {
        self.data = None;
        let data = WavData::parse(bytes)?;
        self.reset();
        self.data = Some(data);
        Ok(())
    }

    fn reset(&mut self) {
        self.sample_offset = 0;
        self.user_time = 0.0;
        self.last_rms = 0.0;
    }

    /// Advances the analysis clock. Returns false when there is nothing to
    /// analyse (no data, or the end was reached).
    pub fn update(&mut self, dt: f32) -> bool {
        let Some(data) = &self.data else {
            self.last_rms = 0.0;
            return false;
        };
        if self.sample_offset >= data.samples_per_channel {
            self.last_rms = 0.0;
            return false;
        }

        self.user_time += dt;
        let goal = ((self.user_time * data.sample_rate as f32).floor() as usize)
            .min(data.samples_per_channel);
        if goal <= self.sample_offset {
            return true;
        }

        let mut sum = 0.0f32;
        for channel in &data.pcm {
            for sample in &channel[self.sample_offset..goal] {
                sum += sample * sample;
            }
        }
        let count = usize::from(data.channels) * (goal - self.sample_offset);
        self.last_rms = (sum / count as f32).sqrt();
        self.sample_offset = goal;
        true
    }

    #[must_use]
    pub fn rms(&self) -> f32 {
        self.last_rms
    }

    #[must_use]
    pub fn data(&self) -> Option<&WavData> {
        self.data.as_ref()
    }

    pub fn release(&mut self) {
        if let Some(player) = &self.player {
            player.stop();
        }
        self.data = None;
        self.reset();
    }
}
