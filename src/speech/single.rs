use tracing::info;

use super::{AudioFormat, DEFAULT_TTS_MODEL, Speech, audio_generation_config, catalog};
use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, SpeechConfig, VoiceConfig,
};

/// One voice reading a prompt in a chosen language.
#[derive(Debug, Clone)]
pub struct SingleSpeaker {
    client: GeminiClient,
    model: String,
    voice: String,
    language: String,
    contents: Option<String>,
    format: AudioFormat,
    response: Option<GenerateContentResponse>,
}

impl SingleSpeaker {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_TTS_MODEL.to_string(),
            voice: "Kore".to_string(),
            language: "en-US".to_string(),
            contents: None,
            format: AudioFormat::default(),
            response: None,
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

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn set_voice(&mut self, voice: &str) -> Result<()> {
        if !catalog::is_voice(voice) {
            return Err(GeminiError::InvalidParameter(format!("unknown voice {voice}")));
        }
        self.voice = voice.to_string();
        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// BCP-47 code from the language catalog, e.g. `fr-FR`.
    pub fn set_language(&mut self, code: &str) -> Result<()> {
        if !catalog::is_language_code(code) {
            return Err(GeminiError::InvalidParameter(format!(
                "unsupported language code {code}"
            )));
        }
        self.language = code.to_string();
        Ok(())
    }

    /// What should be said. Phrase it as an instruction, e.g. "Say cheerfully: ...".
    pub fn update_contents(&mut self, text: impl Into<String>) {
        self.contents = Some(text.into());
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub(crate) fn build_request(&self) -> Result<GenerateContentRequest> {
        let text = self
            .contents
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GeminiError::InvalidInput("no text to speak".to_string()))?;
        Ok(GenerateContentRequest {
            contents: vec![Content::user_text(text)],
            system_instruction: None,
            generation_config: Some(audio_generation_config(SpeechConfig {
                voice_config: Some(VoiceConfig::prebuilt(&self.voice)),
                multi_speaker_voice_config: None,
                language_code: Some(self.language.clone()),
            })),
        })
    }

    pub async fn generate(&mut self) -> Result<&GenerateContentResponse> {
        let request = self.build_request()?;
        let response = self.client.generate_content(&self.model, &request).await?;
        info!(model = %self.model, voice = %self.voice, language = %self.language, "Speech generated");
        Ok(&*self.response.insert(response))
    }
}

impl Speech for SingleSpeaker {
    fn client(&self) -> &GeminiClient {
        &self.client
    }

    fn audio_format(&self) -> &AudioFormat {
        &self.format
    }

    fn audio_format_mut(&mut self) -> &mut AudioFormat {
        &mut self.format
    }

    fn response(&self) -> Option<&GenerateContentResponse> {
        self.response.as_ref()
    }
}
