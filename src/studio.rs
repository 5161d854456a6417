//! One entry point holding every wrapper on a shared client.

use tracing::info;

use crate::client::GeminiClient;
use crate::config::GeminiConfig;
use crate::error::Result;
use crate::image_edit::ImageEditor;
use crate::imagen::ImageGenerator;
use crate::music::MusicGenerator;
use crate::speech::{MultiSpeaker, SingleSpeaker};
use crate::text::TextGenerator;
use crate::video::VideoGenerator;

/// Text, image, video, speech and music generation behind one API key.
#[derive(Debug)]
pub struct GeminiStudio {
    client: GeminiClient,
    pub text: TextGenerator,
    pub image: ImageEditor,
    pub imagen: ImageGenerator,
    pub video: VideoGenerator,
    pub single_speaker: SingleSpeaker,
    pub multi_speaker: MultiSpeaker,
    pub music: MusicGenerator,
}

impl GeminiStudio {
    /// Build the client and create the output directory.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        Self::with_client(client)
    }

    /// Configuration from `GEMINI_API_KEY` / `GOOGLE_API_KEY` and friends.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn with_client(client: GeminiClient) -> Result<Self> {
        let output = client.output_dir();
        output.ensure()?;
        info!(output_dir = %output.path().display(), "Gemini studio ready");
        Ok(Self {
            text: TextGenerator::new(client.clone()),
            image: ImageEditor::new(client.clone()),
            imagen: ImageGenerator::new(client.clone()),
            video: VideoGenerator::new(client.clone()),
            single_speaker: SingleSpeaker::new(client.clone()),
            multi_speaker: MultiSpeaker::new(client.clone()),
            music: MusicGenerator::new(client.clone()),
            client,
        })
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    /// Switch every wrapper to a new API key. Settings, prompts and chat history
    /// are kept. An open music session keeps its original connection.
    pub fn update_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        let mut config = self.client.config().clone();
        config.set_api_key(api_key);
        let client = GeminiClient::new(config)?;

        self.text.set_client(client.clone());
        self.image.set_client(client.clone());
        self.imagen.set_client(client.clone());
        self.video.set_client(client.clone());
        self.single_speaker.set_client(client.clone());
        self.multi_speaker.set_client(client.clone());
        self.music.set_client(client.clone());
        self.client = client;
        info!("API key updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn creates_output_directory_and_wrappers() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested").join("Output");
        let studio = GeminiStudio::new(GeminiConfig::new("key-one").with_output_dir(&out)).unwrap();

        assert!(out.is_dir());
        assert_eq!(studio.text.model(), crate::text::DEFAULT_TEXT_MODEL);
        assert_eq!(studio.video.model(), crate::video::DEFAULT_VIDEO_MODEL);
    }

    #[test]
    fn update_key_keeps_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let mut studio =
            GeminiStudio::new(GeminiConfig::new("key-one").with_output_dir(tmp.path())).unwrap();
        studio.text.set_temperature(0.7).unwrap();

        studio.update_key("key-two").unwrap();
        assert_eq!(studio.client().config().api_key.expose_secret(), "key-two");
        assert_eq!(studio.text.temperature(), 0.7);
    }

    #[test]
    fn empty_key_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut studio =
            GeminiStudio::new(GeminiConfig::new("key-one").with_output_dir(tmp.path())).unwrap();
        assert!(studio.update_key("  ").is_err());
        assert_eq!(studio.client().config().api_key.expose_secret(), "key-one");
    }
}
