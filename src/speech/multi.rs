use tracing::info;

use super::{AudioFormat, DEFAULT_TTS_MODEL, Speech, audio_generation_config, catalog};
use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, MultiSpeakerVoiceConfig,
    SpeakerVoiceConfig, SpeechConfig, VoiceConfig,
};

pub const SPEAKER_SLOTS: usize = 2;

/// Two named speakers, each with a prebuilt voice.
///
/// The prompt should name the speakers the same way, e.g.
/// `TTS the following conversation between Joe and Jane: Joe: ... Jane: ...`.
#[derive(Debug, Clone)]
pub struct MultiSpeaker {
    client: GeminiClient,
    model: String,
    speakers: [Option<String>; SPEAKER_SLOTS],
    voices: [String; SPEAKER_SLOTS],
    contents: Option<String>,
    format: AudioFormat,
    response: Option<GenerateContentResponse>,
}

impl MultiSpeaker {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_TTS_MODEL.to_string(),
            speakers: [None, None],
            voices: ["Zephyr".to_string(), "Kore".to_string()],
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

    fn check_slot(slot: usize) -> Result<()> {
        if slot >= SPEAKER_SLOTS {
            return Err(GeminiError::InvalidParameter(format!(
                "speaker slot must be 0 or 1, got {slot}"
            )));
        }
        Ok(())
    }

    /// Name used for the speaker in `slot` (the role the model takes on).
    pub fn set_speaker_name(&mut self, slot: usize, name: impl Into<String>) -> Result<()> {
        Self::check_slot(slot)?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GeminiError::InvalidParameter(
                "speaker name must not be empty".to_string(),
            ));
        }
        self.speakers[slot] = Some(name);
        Ok(())
    }

    pub fn set_voice(&mut self, slot: usize, voice: &str) -> Result<()> {
        Self::check_slot(slot)?;
        if !catalog::is_voice(voice) {
            return Err(GeminiError::InvalidParameter(format!("unknown voice {voice}")));
        }
        self.voices[slot] = voice.to_string();
        Ok(())
    }

    pub fn speakers(&self) -> &[Option<String>; SPEAKER_SLOTS] {
        &self.speakers
    }

    pub fn voices(&self) -> &[String; SPEAKER_SLOTS] {
        &self.voices
    }

    /// Append a line to the conversation.
    pub fn update_contents(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        match &mut self.contents {
            Some(contents) => {
                contents.push_str(", ");
                contents.push_str(line);
            }
            None => self.contents = Some(line.to_string()),
        }
    }

    pub fn clear_contents(&mut self) {
        self.contents = None;
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub(crate) fn build_request(&self) -> Result<GenerateContentRequest> {
        let text = self
            .contents
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GeminiError::InvalidInput("no conversation to speak".to_string()))?;

        let mut configs = Vec::with_capacity(SPEAKER_SLOTS);
        for (slot, (speaker, voice)) in self.speakers.iter().zip(&self.voices).enumerate() {
            let speaker = speaker.as_ref().ok_or_else(|| {
                GeminiError::InvalidInput(format!("speaker {slot} has no name"))
            })?;
            configs.push(SpeakerVoiceConfig {
                speaker: speaker.clone(),
                voice_config: VoiceConfig::prebuilt(voice),
            });
        }

        Ok(GenerateContentRequest {
            contents: vec![Content::user_text(text)],
            system_instruction: None,
            generation_config: Some(audio_generation_config(SpeechConfig {
                voice_config: None,
                multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                    speaker_voice_configs: configs,
                }),
                language_code: None,
            })),
        })
    }

    pub async fn generate(&mut self) -> Result<&GenerateContentResponse> {
        let request = self.build_request()?;
        let response = self.client.generate_content(&self.model, &request).await?;
        info!(model = %self.model, "Conversation generated");
        Ok(&*self.response.insert(response))
    }
}

impl Speech for MultiSpeaker {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;
    use serde_json::json;

    fn speaker() -> MultiSpeaker {
        MultiSpeaker::new(GeminiClient::new(GeminiConfig::new("test-key")).unwrap())
    }

    #[test]
    fn lines_are_joined_with_commas() {
        let mut tts = speaker();
        tts.update_contents("TTS the following conversation between Joe and Jane:");
        tts.update_contents("Joe: How's it going today Jane?");
        assert_eq!(
            tts.contents(),
            Some("TTS the following conversation between Joe and Jane:, Joe: How's it going today Jane?")
        );
        tts.clear_contents();
        assert_eq!(tts.contents(), None);
    }

    #[test]
    fn both_speakers_must_be_named() {
        let mut tts = speaker();
        tts.update_contents("Joe: hi");
        tts.set_speaker_name(0, "Joe").unwrap();
        assert!(matches!(
            tts.build_request(),
            Err(GeminiError::InvalidInput(_))
        ));

        tts.set_speaker_name(1, "Jane").unwrap();
        tts.set_voice(1, "Puck").unwrap();
        let body = serde_json::to_value(tts.build_request().unwrap()).unwrap();
        assert_eq!(
            body["generationConfig"]["speechConfig"]["multiSpeakerVoiceConfig"]["speakerVoiceConfigs"],
            json!([
                { "speaker": "Joe", "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Zephyr" } } },
                { "speaker": "Jane", "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Puck" } } }
            ])
        );
    }

    #[test]
    fn slots_and_voices_are_validated() {
        let mut tts = speaker();
        assert!(tts.set_speaker_name(2, "Max").is_err());
        assert!(tts.set_speaker_name(0, " ").is_err());
        assert!(tts.set_voice(0, "Nobody").is_err());
        assert!(tts.set_voice(5, "Kore").is_err());
        assert_eq!(tts.voices(), &["Zephyr".to_string(), "Kore".to_string()]);
    }
}
