//! Still image generation with Imagen (`models/{model}:predict`).
//!
//! Imagen is the paid, higher fidelity option: photorealism, specific art styles,
//! logos and product shots. Requests carry the prompt plus three knobs: image count,
//! aspect ratio and person generation policy.

use image::DynamicImage;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::media::{decode_image, save_jpeg};
use crate::types::{Blob, PersonGeneration};

pub const DEFAULT_IMAGEN_MODEL: &str = "imagen-3.0-generate-002";

/// Aspect ratios accepted by Imagen.
pub const IMAGE_ASPECT_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "9:16", "16:9"];

#[derive(Debug, Clone, Default, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

/// One image returned by Imagen.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub blob: Blob,
}

impl GeneratedImage {
    pub fn decode(&self) -> Result<DynamicImage> {
        decode_image(&self.blob)
    }
}

/// Imagen wrapper.
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    client: GeminiClient,
    model: String,
    prompt: Option<String>,
    number_of_images: u8,
    aspect_ratio: String,
    person_generation: PersonGeneration,
    images: Option<Vec<GeneratedImage>>,
}

impl ImageGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_IMAGEN_MODEL.to_string(),
            prompt: None,
            number_of_images: 1,
            aspect_ratio: "1:1".to_string(),
            person_generation: PersonGeneration::AllowAdult,
            images: None,
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

    pub fn update_contents(&mut self, prompt: impl Into<String>) {
        self.prompt = Some(prompt.into());
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn number_of_images(&self) -> u8 {
        self.number_of_images
    }

    /// 1 to 4 images per request.
    pub fn set_number_of_images(&mut self, n: u8) -> Result<()> {
        if !(1..=4).contains(&n) {
            return Err(GeminiError::InvalidParameter(format!(
                "number_of_images must be between 1 and 4, got {n}"
            )));
        }
        self.number_of_images = n;
        Ok(())
    }

    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, ratio: &str) -> Result<()> {
        if !IMAGE_ASPECT_RATIOS.contains(&ratio) {
            return Err(GeminiError::InvalidParameter(format!(
                "unsupported aspect ratio {ratio}, expected one of {IMAGE_ASPECT_RATIOS:?}"
            )));
        }
        self.aspect_ratio = ratio.to_string();
        Ok(())
    }

    pub fn person_generation(&self) -> PersonGeneration {
        self.person_generation
    }

    pub fn disable_person_generation(&mut self) {
        self.person_generation = PersonGeneration::DontAllow;
    }

    pub fn enable_person_generation(&mut self) {
        self.person_generation = PersonGeneration::AllowAdult;
    }

    /// Allow people of every age. Not available in the EU, UK, CH and MENA.
    pub fn enable_all_person_generation(&mut self) {
        self.person_generation = PersonGeneration::AllowAll;
    }

    pub(crate) fn build_body(&self) -> Result<serde_json::Value> {
        let prompt = self
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| GeminiError::InvalidInput("no prompt set".to_string()))?;
        Ok(json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": self.number_of_images,
                "aspectRatio": self.aspect_ratio,
                "personGeneration": self.person_generation.as_str(),
            }
        }))
    }

    /// Generate images for the current prompt.
    pub async fn generate(&mut self) -> Result<&[GeneratedImage]> {
        let body = self.build_body()?;
        let raw = self.client.predict(&self.model, &body).await?;
        let response: PredictResponse = serde_json::from_value(raw)?;

        let mut images = Vec::with_capacity(response.predictions.len());
        for prediction in response.predictions {
            match prediction.bytes_base64_encoded {
                Some(data) => images.push(GeneratedImage {
                    blob: Blob {
                        mime_type: prediction
                            .mime_type
                            .unwrap_or_else(|| "image/png".to_string()),
                        data,
                    },
                }),
                None => warn!(
                    reason = prediction.rai_filtered_reason.as_deref().unwrap_or("unknown"),
                    "Image filtered by safety policy"
                ),
            }
        }
        info!(model = %self.model, images = images.len(), "Imagen response received");
        Ok(self.images.insert(images).as_slice())
    }

    pub fn images(&self) -> &[GeneratedImage] {
        self.images.as_deref().unwrap_or_default()
    }

    /// Save every image as `new_image{n}.jpg`, numbering each file separately.
    pub fn save_images(&self) -> Result<Vec<PathBuf>> {
        let images = self
            .images
            .as_ref()
            .ok_or_else(|| GeminiError::MissingResponse("nothing generated yet".to_string()))?;
        let output = self.client.output_dir();
        images
            .iter()
            .map(|image| save_jpeg(&output, "new_image", &image.decode()?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    fn generator() -> ImageGenerator {
        ImageGenerator::new(GeminiClient::new(GeminiConfig::new("test-key")).unwrap())
    }

    #[test]
    fn body_reflects_settings() {
        let mut imagen = generator();
        imagen.update_contents("a lighthouse at dusk");
        imagen.set_number_of_images(3).unwrap();
        imagen.set_aspect_ratio("16:9").unwrap();
        imagen.disable_person_generation();

        assert_eq!(
            imagen.build_body().unwrap(),
            json!({
                "instances": [{ "prompt": "a lighthouse at dusk" }],
                "parameters": {
                    "sampleCount": 3,
                    "aspectRatio": "16:9",
                    "personGeneration": "dont_allow"
                }
            })
        );
    }

    #[test]
    fn invalid_settings_keep_previous_values() {
        let mut imagen = generator();
        assert!(imagen.set_number_of_images(0).is_err());
        assert!(imagen.set_number_of_images(5).is_err());
        assert!(imagen.set_aspect_ratio("2:1").is_err());
        assert_eq!(imagen.number_of_images(), 1);
        assert_eq!(imagen.aspect_ratio(), "1:1");
    }

    #[test]
    fn person_generation_toggles() {
        let mut imagen = generator();
        assert_eq!(imagen.person_generation(), PersonGeneration::AllowAdult);
        imagen.enable_all_person_generation();
        assert_eq!(imagen.person_generation().as_str(), "allow_all");
        imagen.enable_person_generation();
        assert_eq!(imagen.person_generation(), PersonGeneration::AllowAdult);
    }

    #[test]
    fn missing_prompt_is_rejected() {
        assert!(matches!(
            generator().build_body(),
            Err(GeminiError::InvalidInput(_))
        ));
    }
}
