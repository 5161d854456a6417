//! Conversational image generation and editing with a native Gemini image model.
//!
//! Prompt lines accumulate with [`ImageEditor::update_contents`]; an optional uploaded
//! image is sent after them. Responses mix text and inline images.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::media::{LocalImage, decode_image, save_jpeg};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Modality, Part,
};

pub const DEFAULT_IMAGE_EDIT_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Text + image conversational wrapper.
#[derive(Debug, Clone)]
pub struct ImageEditor {
    client: GeminiClient,
    model: String,
    prompts: Vec<String>,
    image: Option<LocalImage>,
    response: Option<GenerateContentResponse>,
}

impl ImageEditor {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_IMAGE_EDIT_MODEL.to_string(),
            prompts: Vec::new(),
            image: None,
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

    /// Append a prompt line. Empty lines are ignored.
    pub fn update_contents(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        if !prompt.is_empty() {
            self.prompts.push(prompt);
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn clear_contents(&mut self) {
        self.prompts.clear();
    }

    /// Attach an image to edit. It is sent after the prompt lines.
    pub fn upload_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.image = Some(LocalImage::open(path)?);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub(crate) fn build_request(&self) -> Result<GenerateContentRequest> {
        if self.prompts.is_empty() && self.image.is_none() {
            return Err(GeminiError::InvalidInput("no prompt set".to_string()));
        }
        let mut parts: Vec<Part> = self.prompts.iter().map(Part::text).collect();
        if let Some(image) = &self.image {
            parts.push(image.to_part());
        }
        Ok(GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec![Modality::Text, Modality::Image]),
                ..Default::default()
            }),
        })
    }

    /// Run the model on the current prompt (and image).
    pub async fn generate(&mut self) -> Result<&GenerateContentResponse> {
        let request = self.build_request()?;
        let response = self.client.generate_content(&self.model, &request).await?;
        info!(
            model = %self.model,
            images = response.inline_data().len(),
            "Image response received"
        );
        Ok(&*self.response.insert(response))
    }

    pub fn response(&self) -> Option<&GenerateContentResponse> {
        self.response.as_ref()
    }

    /// Text parts of the response joined by a space.
    pub fn text_response(&self) -> Option<String> {
        self.response.as_ref().map(|r| r.text_parts().join(" "))
    }

    pub fn display_text_response(&self) {
        if let Some(response) = &self.response {
            for text in response.text_parts() {
                println!("{text}");
            }
        }
    }

    /// Decoded images of the response. Parts that fail to decode are skipped.
    pub fn images(&self) -> Vec<DynamicImage> {
        let Some(response) = &self.response else {
            return Vec::new();
        };
        response
            .inline_data()
            .into_iter()
            .filter(|blob| blob.mime_type.starts_with("image/"))
            .filter_map(|blob| match decode_image(blob) {
                Ok(image) => Some(image),
                Err(err) => {
                    warn!(error = %err, "Skipping undecodable image part");
                    None
                }
            })
            .collect()
    }

    /// Save every image as `new_image{n}.jpg` in the output directory.
    pub fn save_images(&self) -> Result<Vec<PathBuf>> {
        if self.response.is_none() {
            return Err(GeminiError::MissingResponse("nothing generated yet".to_string()));
        }
        let output = self.client.output_dir();
        self.images()
            .iter()
            .map(|image| save_jpeg(&output, "new_image", image))
            .collect()
    }
}
