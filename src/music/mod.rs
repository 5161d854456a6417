//! Realtime music generation with Lyria.
//!
//! Prompts and generation settings are collected on a [`MusicGenerator`]. Calling
//! [`MusicGenerator::generate`] opens a [`MusicSession`], sends both, starts
//! playback and feeds decoded audio into an [`AudioSink`].

pub mod catalog;
mod config;
mod session;
mod sink;

pub use config::{MusicGenerationConfig, Scale, WeightedPrompt};
pub use session::{MUSIC_ENDPOINT, MusicController, MusicSession, PlaybackControl, StreamFormat};
pub use sink::{AudioFrame, AudioSink, BufferSink, WavSink};

use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::speech::SUPPORTED_RATES;

pub const DEFAULT_MUSIC_MODEL: &str = "models/lyria-realtime-exp";

/// Lyria wrapper.
#[derive(Debug)]
pub struct MusicGenerator {
    client: GeminiClient,
    model: String,
    format: StreamFormat,
    contents: Option<String>,
    weight: f32,
    prompts: Vec<WeightedPrompt>,
    config: MusicGenerationConfig,
    session: Option<MusicSession>,
}

impl MusicGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_MUSIC_MODEL.to_string(),
            format: StreamFormat::default(),
            contents: None,
            weight: 1.0,
            prompts: Vec::new(),
            config: MusicGenerationConfig::default(),
            session: None,
        }
    }

    pub(crate) fn set_client(&mut self, client: GeminiClient) {
        self.client = client;
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn update_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
    }

    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn set_channels(&mut self, channels: u16) -> Result<()> {
        if !(1..=2).contains(&channels) {
            return Err(GeminiError::InvalidParameter(format!(
                "channels must be 1 or 2, got {channels}"
            )));
        }
        self.format.channels = channels;
        Ok(())
    }

    pub fn set_rate(&mut self, rate: u32) -> Result<()> {
        if !SUPPORTED_RATES.contains(&rate) {
            return Err(GeminiError::InvalidParameter(format!(
                "unsupported sample rate {rate}, expected one of {SUPPORTED_RATES:?}"
            )));
        }
        self.format.sample_rate = rate;
        Ok(())
    }

    // Prompts

    /// Text of the next prompt added with [`Self::add_to_prompt`].
    pub fn update_contents(&mut self, text: impl Into<String>) {
        self.contents = Some(text.into());
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Weight of the next prompt. Must be finite and non-zero.
    pub fn update_weight(&mut self, weight: f32) -> Result<()> {
        if !weight.is_finite() || weight == 0.0 {
            return Err(GeminiError::InvalidParameter(format!(
                "prompt weight must be finite and non-zero, got {weight}"
            )));
        }
        self.weight = weight;
        Ok(())
    }

    /// Push the current text and weight as a new weighted prompt.
    pub fn add_to_prompt(&mut self) -> Result<&WeightedPrompt> {
        let text = self
            .contents
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GeminiError::InvalidInput("no prompt text set".to_string()))?;
        let index = self.prompts.len();
        self.prompts.push(WeightedPrompt::new(text, self.weight));
        debug!(prompts = self.prompts.len(), "Added weighted prompt");
        Ok(&self.prompts[index])
    }

    pub fn prompts(&self) -> &[WeightedPrompt] {
        &self.prompts
    }

    pub fn clear_prompts(&mut self) {
        self.prompts.clear();
    }

    // Generation config

    pub fn config(&self) -> &MusicGenerationConfig {
        &self.config
    }

    fn update_config(&mut self, change: impl FnOnce(&mut MusicGenerationConfig)) -> Result<()> {
        let mut next = self.config.clone();
        change(&mut next);
        next.validate()?;
        self.config = next;
        Ok(())
    }

    /// How strictly the prompts are followed, 0 to 6. Higher values make transitions
    /// more abrupt.
    pub fn set_guidance(&mut self, guidance: f32) -> Result<()> {
        self.update_config(|c| c.guidance = guidance)
    }

    /// 60 to 200. Applied after stop/play or a context reset.
    pub fn set_bpm(&mut self, bpm: u32) -> Result<()> {
        self.update_config(|c| c.bpm = bpm)
    }

    /// Note density, 0 (sparse) to 1 (busy).
    pub fn set_density(&mut self, density: f32) -> Result<()> {
        self.update_config(|c| c.density = Some(density))
    }

    /// Tonal brightness, 0 to 1.
    pub fn set_brightness(&mut self, brightness: f32) -> Result<()> {
        self.update_config(|c| c.brightness = Some(brightness))
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.config.scale = scale;
    }

    pub fn toggle_bass(&mut self) -> bool {
        self.config.mute_bass = !self.config.mute_bass;
        self.config.mute_bass
    }

    pub fn toggle_drums(&mut self) -> bool {
        self.config.mute_drums = !self.config.mute_drums;
        self.config.mute_drums
    }

    pub fn toggle_only_bass_and_drums(&mut self) -> bool {
        self.config.only_bass_and_drums = !self.config.only_bass_and_drums;
        self.config.only_bass_and_drums
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        self.update_config(|c| c.temperature = temperature)
    }

    pub fn set_top_k(&mut self, top_k: u32) -> Result<()> {
        self.update_config(|c| c.top_k = top_k)
    }

    pub fn set_seed(&mut self, seed: u32) -> Result<()> {
        self.update_config(|c| c.seed = Some(seed))
    }

    // Catalogs

    pub fn instruments(&self) -> &'static [&'static str] {
        &catalog::INSTRUMENTS
    }

    pub fn genres(&self) -> &'static [&'static str] {
        &catalog::GENRES
    }

    pub fn moods(&self) -> &'static [&'static str] {
        &catalog::MOODS
    }

    pub fn scales(&self) -> &'static [Scale] {
        &Scale::ALL
    }

    pub fn display_instruments(&self) {
        for instrument in self.instruments() {
            println!("{instrument}");
        }
    }

    pub fn display_genres(&self) {
        for genre in self.genres() {
            println!("{genre}");
        }
    }

    pub fn display_moods(&self) {
        for mood in self.moods() {
            println!("{mood}");
        }
    }

    pub fn display_scale_options(&self) {
        for scale in self.scales() {
            println!("{} {}", scale.display_key(), scale.as_str());
        }
    }

    // Session

    pub fn session(&self) -> Option<&MusicSession> {
        self.session.as_ref()
    }

    /// Open a session (if needed), send prompts and config, and start playback.
    pub async fn start(&mut self) -> Result<&MusicSession> {
        if self.prompts.is_empty() {
            return Err(GeminiError::InvalidInput(
                "add at least one prompt before generating music".to_string(),
            ));
        }
        if self.session.is_none() {
            let url = self.client.live_url(MUSIC_ENDPOINT);
            let session = MusicSession::connect(&url, &self.model, self.format).await?;
            self.session = Some(session);
        }
        let Some(session) = self.session.as_ref() else {
            return Err(GeminiError::WebSocketError("music session not open".to_string()));
        };
        session.set_weighted_prompts(&self.prompts).await?;
        session.set_music_generation_config(&self.config).await?;
        session.play().await?;
        info!(session_id = %session.id(), prompts = self.prompts.len(), "Music playback started");
        Ok(session)
    }

    /// Resend the current config to an open session.
    pub async fn sync_config(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.set_music_generation_config(&self.config).await,
            None => Ok(()),
        }
    }

    /// Start playback and pump audio into `sink` until the server closes the stream
    /// or `limit` elapses. Returns the number of frames written.
    pub async fn generate<S>(&mut self, sink: &mut S, limit: Option<Duration>) -> Result<usize>
    where
        S: AudioSink + ?Sized,
    {
        self.start().await?;
        self.pump(sink, limit).await
    }

    /// Forward frames from the open session without sending anything.
    pub async fn pump<S>(&mut self, sink: &mut S, limit: Option<Duration>) -> Result<usize>
    where
        S: AudioSink + ?Sized,
    {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| GeminiError::InvalidInput("no open music session".to_string()))?;
        let deadline = limit.map(|limit| Instant::now() + limit);

        let mut frames = 0;
        let mut ended = false;
        loop {
            let next = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, session.next_frame()).await {
                        Ok(next) => next,
                        Err(_) => break,
                    }
                }
                None => session.next_frame().await,
            };
            match next {
                Some(Ok(frame)) => {
                    sink.write(&frame)?;
                    frames += 1;
                }
                Some(Err(e)) => {
                    sink.flush()?;
                    return Err(e);
                }
                None => {
                    ended = true;
                    break;
                }
            }
        }
        sink.flush()?;

        if ended && let Some(session) = self.session.take() {
            info!(session_id = %session.id(), frames, "Music stream ended");
            session.close().await?;
        }
        Ok(frames)
    }

    /// Stream into `Output/music{n}.wav` for `duration`.
    ///
    /// The file is only created once the session is playing, and removed again if
    /// streaming fails.
    pub async fn save_music(&mut self, duration: Duration) -> Result<PathBuf> {
        self.start().await?;
        let path = self.client.output_dir().next_path("music", "wav")?;
        let mut sink = WavSink::create(&path, self.format.channels, self.format.sample_rate)?;
        match self.pump(&mut sink, Some(duration)).await {
            Ok(frames) => {
                debug!(path = %path.display(), frames, "Saved music");
                sink.finalize()
            }
            Err(e) => {
                drop(sink);
                if let Err(remove) = std::fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %remove, "Could not remove incomplete music file");
                }
                Err(e)
            }
        }
    }

    pub async fn play(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.play().await,
            None => Ok(()),
        }
    }

    pub async fn pause(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.pause().await,
            None => Ok(()),
        }
    }

    pub async fn stop(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.stop().await,
            None => Ok(()),
        }
    }

    pub async fn reset(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.reset_context().await,
            None => Ok(()),
        }
    }

    /// Close the open session, if any.
    pub async fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    fn generator() -> MusicGenerator {
        MusicGenerator::new(GeminiClient::new(GeminiConfig::new("test-key")).unwrap())
    }

    #[test]
    fn defaults() {
        let music = generator();
        assert_eq!(music.model(), DEFAULT_MUSIC_MODEL);
        assert_eq!((music.channels(), music.sample_rate()), (2, 48000));
        assert_eq!(music.weight(), 1.0);
        assert_eq!(music.config(), &MusicGenerationConfig::default());
    }

    #[test]
    fn prompts_accumulate_with_their_weight() {
        let mut music = generator();
        assert!(music.add_to_prompt().is_err());

        music.update_contents("Piano Ballad");
        music.add_to_prompt().unwrap();
        music.update_contents("Rhodes Piano");
        music.update_weight(0.5).unwrap();
        music.add_to_prompt().unwrap();

        assert_eq!(
            music.prompts(),
            &[
                WeightedPrompt::new("Piano Ballad", 1.0),
                WeightedPrompt::new("Rhodes Piano", 0.5)
            ]
        );
        music.clear_prompts();
        assert!(music.prompts().is_empty());
    }

    #[test]
    fn setters_validate_and_keep_state_on_error() {
        let mut music = generator();
        assert!(music.set_bpm(59).is_err());
        assert!(music.set_guidance(6.5).is_err());
        assert!(music.set_density(1.2).is_err());
        assert!(music.set_temperature(3.1).is_err());
        assert!(music.set_top_k(1001).is_err());
        assert!(music.set_seed(2_147_483_648).is_err());
        assert!(music.update_weight(0.0).is_err());
        assert!(music.set_rate(22050).is_err());
        assert_eq!(music.config(), &MusicGenerationConfig::default());

        music.set_brightness(0.7).unwrap();
        music.set_bpm(120).unwrap();
        music.set_scale(Scale::DMajorBMinor);
        assert_eq!(music.config().brightness, Some(0.7));
        assert_eq!(music.config().density, None);
        assert_eq!(music.config().bpm, 120);
        assert_eq!(music.config().scale, Scale::DMajorBMinor);
    }

    #[test]
    fn nan_setters_are_rejected() {
        let mut music = generator();
        assert!(music.set_guidance(f32::NAN).is_err());
        assert!(music.set_temperature(f32::NAN).is_err());
        assert!(music.set_density(f32::NAN).is_err());
        assert!(music.set_brightness(f32::NAN).is_err());
        assert_eq!(music.config(), &MusicGenerationConfig::default());
    }

    #[test]
    fn toggles_flip() {
        let mut music = generator();
        assert!(music.toggle_bass());
        assert!(!music.toggle_bass());
        assert!(music.toggle_drums());
        assert!(music.toggle_only_bass_and_drums());
    }

    #[tokio::test]
    async fn generate_requires_prompts() {
        let mut music = generator();
        let mut sink = BufferSink::new();
        assert!(matches!(
            music.generate(&mut sink, None).await,
            Err(GeminiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn save_music_without_prompts_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("Output");
        let mut music = MusicGenerator::new(
            GeminiClient::new(GeminiConfig::new("test-key").with_output_dir(&out)).unwrap(),
        );
        assert!(matches!(
            music.save_music(Duration::from_secs(1)).await,
            Err(GeminiError::InvalidInput(_))
        ));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn controls_without_session_are_noops() {
        let music = generator();
        music.play().await.unwrap();
        music.pause().await.unwrap();
        music.stop().await.unwrap();
        music.reset().await.unwrap();
        music.sync_config().await.unwrap();
    }
}
