//! Text generation and chat
//!
//! [`TextGenerator`] keeps the prompt and sampling settings between calls. It can answer
//! once (`generate`), stream the answer (`generate_stream`), or hold a multi-turn
//! [`ChatSession`] that resends the whole history on every message.

use chrono::{DateTime, Utc};
use futures::Stream;
use futures_util::StreamExt;
use std::io::Write;
use std::path::Path;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::media::LocalImage;
use crate::types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;

/// Stream of text chunks.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Text completion wrapper.
#[derive(Debug, Clone)]
pub struct TextGenerator {
    client: GeminiClient,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    system_instruction: Option<String>,
    contents: Option<Content>,
    response: Option<GenerateContentResponse>,
    chat: Option<ChatSession>,
}

impl TextGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_TEXT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            system_instruction: None,
            contents: None,
            response: None,
            chat: None,
        }
    }

    pub(crate) fn set_client(&mut self, client: GeminiClient) {
        if let Some(chat) = self.chat.as_mut() {
            chat.client = client.clone();
        }
        self.client = client;
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switch model; empty names are ignored.
    pub fn update_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Randomness of the output, strictly between 0 and 2.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        if !(temperature > 0.0 && temperature < 2.0) {
            return Err(GeminiError::InvalidParameter(format!(
                "temperature must be between 0 and 2 (exclusive), got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Upper bound on generated tokens per response.
    pub fn set_max_output_tokens(&mut self, max_output_tokens: u32) -> Result<()> {
        if max_output_tokens == 0 {
            return Err(GeminiError::InvalidParameter(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }
        self.max_output_tokens = max_output_tokens;
        Ok(())
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    /// The role or character the model should take on.
    pub fn set_system_instruction(&mut self, instruction: impl Into<String>) {
        self.system_instruction = Some(instruction.into());
    }

    pub fn clear_system_instruction(&mut self) {
        self.system_instruction = None;
    }

    /// Replace the prompt with a single text turn.
    pub fn update_contents(&mut self, prompt: impl Into<String>) {
        self.contents = Some(Content::user_text(prompt));
    }

    /// Replace the prompt with a multimodal turn, e.g. `[open_image(..), text]`.
    pub fn set_parts(&mut self, parts: Vec<Part>) {
        self.contents = Some(Content::user(parts));
    }

    pub fn contents(&self) -> Option<&Content> {
        self.contents.as_ref()
    }

    /// Load an image for use in [`set_parts`](Self::set_parts); `None` if the path is not
    /// a readable image file.
    pub fn open_image(&self, path: impl AsRef<Path>) -> Option<Part> {
        match LocalImage::open(path.as_ref()) {
            Ok(image) => Some(image.to_part()),
            Err(err) => {
                warn!(path = %path.as_ref().display(), error = %err, "Could not open image");
                None
            }
        }
    }

    /// Generation config derived from the current settings.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: Some(self.temperature),
            max_output_tokens: Some(self.max_output_tokens),
            ..Default::default()
        }
    }

    fn build_request(&self, contents: Vec<Content>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.as_deref().map(Content::system),
            generation_config: Some(self.generation_config()),
        }
    }

    fn require_contents(&self) -> Result<Content> {
        self.contents
            .clone()
            .ok_or_else(|| GeminiError::InvalidInput("no prompt set".to_string()))
    }

    /// One-shot completion. The response is kept for the accessors.
    pub async fn generate(&mut self) -> Result<&GenerateContentResponse> {
        let request = self.build_request(vec![self.require_contents()?]);
        let response = self.client.generate_content(&self.model, &request).await?;
        debug!(model = %self.model, chars = response.text().len(), "Text generated");
        Ok(&*self.response.insert(response))
    }

    /// Streamed completion: yields text chunks as they arrive.
    pub async fn generate_stream(&self) -> Result<TextStream> {
        let request = self.build_request(vec![self.require_contents()?]);
        let stream = self
            .client
            .stream_generate_content(&self.model, &request)
            .await?;
        Ok(Box::pin(stream.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => {
                    let text = chunk.text();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(err) => Some(Err(err)),
            }
        })))
    }

    /// Print a streamed completion as it arrives and keep the full text as the response.
    pub async fn display_stream(&mut self) -> Result<String> {
        let mut stream = self.generate_stream().await?;
        let mut full = String::new();
        let mut stdout = std::io::stdout();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            print!("{chunk}");
            stdout.flush()?;
            full.push_str(&chunk);
        }
        println!();

        self.response = Some(GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content::model(vec![Part::text(full.clone())])),
                finish_reason: Some("STOP".to_string()),
            }],
            ..Default::default()
        });
        Ok(full)
    }

    pub fn response(&self) -> Option<&GenerateContentResponse> {
        self.response.as_ref()
    }

    /// Text of the last response.
    pub fn response_text(&self) -> Option<String> {
        self.response.as_ref().map(|r| r.text())
    }

    pub fn display_response(&self) {
        if let Some(text) = self.response_text() {
            println!("{text}");
        }
    }

    /// Start a chat using the current model, instruction and sampling settings.
    pub fn start_chat(&mut self) -> &mut ChatSession {
        let session = ChatSession {
            client: self.client.clone(),
            model: self.model.clone(),
            system_instruction: self.system_instruction.clone(),
            generation_config: self.generation_config(),
            history: Vec::new(),
        };
        self.chat.insert(session)
    }

    pub fn chat(&self) -> Option<&ChatSession> {
        self.chat.as_ref()
    }

    /// Send a message in the current chat; the reply becomes the stored response.
    pub async fn send_chat_message(&mut self, message: impl Into<String>) -> Result<String> {
        let chat = self
            .chat
            .as_mut()
            .ok_or_else(|| GeminiError::InvalidInput("no chat started".to_string()))?;
        let response = chat.send_message(message).await?;
        let text = response.text();
        self.response = Some(response);
        Ok(text)
    }

    /// History of the current chat (empty when no chat was started).
    pub fn chat_history(&self) -> &[ChatTurn] {
        self.chat.as_ref().map(|c| c.history()).unwrap_or_default()
    }

    pub fn display_chat_history(&self) {
        if let Some(chat) = &self.chat {
            print!("{}", chat.format_history());
        }
    }
}

/// One message of a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub content: Content,
    pub created: DateTime<Utc>,
}

impl ChatTurn {
    pub fn role(&self) -> &str {
        self.content.role.as_deref().unwrap_or("user")
    }

    /// Text of the first part.
    pub fn text(&self) -> &str {
        self.content
            .parts
            .first()
            .and_then(|p| p.text.as_deref())
            .unwrap_or_default()
    }
}

/// A multi-turn conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: GeminiClient,
    model: String,
    system_instruction: Option<String>,
    generation_config: GenerationConfig,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    /// Send a message with the full history. History only grows when the call succeeds.
    pub async fn send_message(
        &mut self,
        message: impl Into<String>,
    ) -> Result<GenerateContentResponse> {
        let user = Content::user_text(message);

        let mut contents: Vec<Content> = self.history.iter().map(|t| t.content.clone()).collect();
        contents.push(user.clone());

        let request = GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.as_deref().map(Content::system),
            generation_config: Some(self.generation_config.clone()),
        };
        let response = self.client.generate_content(&self.model, &request).await?;

        let reply = response
            .candidates
            .first()
            .and_then(|c| c.content.clone())
            .map(|mut c| {
                c.role = Some("model".to_string());
                c
            })
            .ok_or_else(|| GeminiError::MissingResponse("chat reply had no content".to_string()))?;

        let now = Utc::now();
        self.history.push(ChatTurn {
            content: user,
            created: now,
        });
        self.history.push(ChatTurn {
            content: reply,
            created: Utc::now(),
        });
        Ok(response)
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// `role - {role}: {text}` per turn.
    pub fn format_history(&self) -> String {
        self.history
            .iter()
            .map(|turn| format!("role - {}: {}\n", turn.role(), turn.text()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    fn generator() -> TextGenerator {
        TextGenerator::new(GeminiClient::new(GeminiConfig::new("test-key")).unwrap())
    }

    #[test]
    fn defaults_match_documented_values() {
        let text = generator();
        assert_eq!(text.model(), "gemini-2.0-flash");
        assert_eq!(text.temperature(), 0.1);
        assert_eq!(text.max_output_tokens(), 500);
        assert!(text.system_instruction().is_none());
        assert!(text.response().is_none());
    }

    #[test]
    fn temperature_bounds_are_exclusive() {
        let mut text = generator();
        assert!(text.set_temperature(0.0).is_err());
        assert!(text.set_temperature(2.0).is_err());
        assert!(text.set_temperature(f32::NAN).is_err());
        assert_eq!(text.temperature(), 0.1);
        text.set_temperature(1.5).unwrap();
        assert_eq!(text.temperature(), 1.5);
    }

    #[test]
    fn zero_tokens_rejected() {
        let mut text = generator();
        assert!(text.set_max_output_tokens(0).is_err());
        text.set_max_output_tokens(42).unwrap();
        assert_eq!(text.generation_config().max_output_tokens, Some(42));
    }

    #[test]
    fn empty_model_name_is_ignored() {
        let mut text = generator();
        text.update_model("  ");
        assert_eq!(text.model(), DEFAULT_TEXT_MODEL);
        text.update_model("gemini-2.5-pro");
        assert_eq!(text.model(), "gemini-2.5-pro");
    }

    #[test]
    fn request_carries_system_instruction() {
        let mut text = generator();
        text.set_system_instruction("You are a pirate");
        text.update_contents("hello");
        let request = text.build_request(vec![text.require_contents().unwrap()]);
        assert_eq!(
            request.system_instruction.unwrap().text(),
            "You are a pirate"
        );
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn generate_without_prompt_is_invalid_input() {
        let mut text = generator();
        assert!(matches!(
            text.generate().await,
            Err(GeminiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn chat_message_without_session_fails() {
        let mut text = generator();
        assert!(text.send_chat_message("hi").await.is_err());
        assert!(text.chat_history().is_empty());
    }

    #[test]
    fn open_image_returns_none_for_missing_file() {
        assert!(generator().open_image("/definitely/not/here.png").is_none());
    }
}
