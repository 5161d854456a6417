//! Text to speech with the Gemini TTS models.
//!
//! [`SingleSpeaker`] reads text in one prebuilt voice and a chosen language.
//! [`MultiSpeaker`] voices a two person conversation, one prebuilt voice per named
//! speaker. Both share [`AudioFormat`] and the output helpers of [`Speech`].

pub mod catalog;
mod multi;
mod single;
pub mod wav;

pub use multi::{MultiSpeaker, SPEAKER_SLOTS};
pub use single::SingleSpeaker;

use std::path::PathBuf;
use tracing::info;

use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::types::{GenerateContentResponse, GenerationConfig, Modality, SpeechConfig};

pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Sample rates accepted for output files.
pub const SUPPORTED_RATES: [u32; 5] = [8000, 16000, 24000, 44100, 48000];

/// Layout of the saved audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    channels: u16,
    sample_rate: u32,
    sample_width: u16,
}

impl AudioFormat {
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes per sample.
    pub fn sample_width(&self) -> u16 {
        self.sample_width
    }

    /// Mono (1) or stereo (2).
    pub fn set_channels(&mut self, channels: u16) -> Result<()> {
        if !(1..=2).contains(&channels) {
            return Err(GeminiError::InvalidParameter(format!(
                "channels must be 1 or 2, got {channels}"
            )));
        }
        self.channels = channels;
        Ok(())
    }

    pub fn set_rate(&mut self, rate: u32) -> Result<()> {
        if !SUPPORTED_RATES.contains(&rate) {
            return Err(GeminiError::InvalidParameter(format!(
                "unsupported sample rate {rate}, expected one of {SUPPORTED_RATES:?}"
            )));
        }
        self.sample_rate = rate;
        Ok(())
    }

    pub fn set_sample_width(&mut self, width: u16) -> Result<()> {
        if !(1..=3).contains(&width) {
            return Err(GeminiError::InvalidParameter(format!(
                "sample width must be 1, 2 or 3 bytes, got {width}"
            )));
        }
        self.sample_width = width;
        Ok(())
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 24000,
            sample_width: 2,
        }
    }
}

/// Output handling shared by the speech generators.
pub trait Speech {
    fn client(&self) -> &GeminiClient;

    fn audio_format(&self) -> &AudioFormat;

    fn audio_format_mut(&mut self) -> &mut AudioFormat;

    /// Last successful response.
    fn response(&self) -> Option<&GenerateContentResponse>;

    fn set_channels(&mut self, channels: u16) -> Result<()> {
        self.audio_format_mut().set_channels(channels)
    }

    fn set_rate(&mut self, rate: u32) -> Result<()> {
        self.audio_format_mut().set_rate(rate)
    }

    fn set_sample_width(&mut self, width: u16) -> Result<()> {
        self.audio_format_mut().set_sample_width(width)
    }

    /// Raw 16-bit PCM of the first audio part.
    fn pcm(&self) -> Result<Vec<u8>> {
        let response = self
            .response()
            .ok_or_else(|| GeminiError::MissingResponse("no speech generated yet".to_string()))?;
        let blob = response
            .inline_data()
            .into_iter()
            .next()
            .ok_or_else(|| GeminiError::MissingResponse("response has no audio".to_string()))?;
        blob.decode()
    }

    /// Write the audio to `out{n}.wav` in the output directory.
    fn save_response(&self) -> Result<PathBuf> {
        let pcm = self.pcm()?;
        let path = self.client().output_dir().next_path("out", "wav")?;
        wav::write_wav(&path, self.audio_format(), &pcm)?;
        info!(path = %path.display(), bytes = pcm.len(), "Saved speech");
        Ok(path)
    }

    /// Decoded samples, interleaved per the audio format.
    fn pcm_samples(&self) -> Result<Vec<f32>> {
        Ok(wav::pcm16_to_f32(&self.pcm()?))
    }

    /// Play the audio on the default output device and block until it ends.
    #[cfg(feature = "playback")]
    fn play_audio(&self) -> Result<()> {
        let format = self.audio_format();
        crate::playback::play_pcm(
            &self.pcm_samples()?,
            format.channels(),
            format.sample_rate(),
        )
    }

    fn voice_options(&self) -> &'static [(&'static str, &'static str)] {
        &catalog::VOICES
    }

    fn display_voice_options(&self) {
        for (name, vibe) in self.voice_options() {
            println!("{name} {vibe}");
        }
    }

    fn language_options(&self) -> &'static [(&'static str, &'static str)] {
        &catalog::LANGUAGES
    }

    fn display_language_options(&self) {
        for (name, code) in self.language_options() {
            println!("{name} {code}");
        }
    }
}

fn audio_generation_config(speech_config: SpeechConfig) -> GenerationConfig {
    GenerationConfig {
        response_modalities: Some(vec![Modality::Audio]),
        speech_config: Some(speech_config),
        ..Default::default()
    }
}
