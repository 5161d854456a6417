//! Video generation with Veo.
//!
//! The REST API uses `models/{model}:predictLongRunning` and returns an operation
//! (`operations/...`) that is polled with `GET /{name}` until `done`. Finished
//! operations list the generated clips as downloadable URIs.

use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::error::{GeminiError, Result};
use crate::media::LocalImage;
use crate::text::DEFAULT_TEXT_MODEL;
use crate::types::{Content, GenerateContentRequest, Operation, Part, PersonGeneration};

pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Aspect ratios accepted by Veo.
pub const VIDEO_ASPECT_RATIOS: [&str; 2] = ["16:9", "9:16"];

const DESCRIBE_IMAGE_PROMPT: &str = "What is this image?";

/// Seed image plus the description the text model gave for it.
#[derive(Debug, Clone)]
pub struct SeedImage {
    pub image: LocalImage,
    pub description: String,
}

/// Veo wrapper.
#[derive(Debug, Clone)]
pub struct VideoGenerator {
    client: GeminiClient,
    model: String,
    text_model: String,
    prompt: Option<String>,
    negative_prompt: Option<String>,
    seed_image: Option<SeedImage>,
    aspect_ratio: String,
    person_generation: PersonGeneration,
    number_of_videos: u8,
    duration_seconds: u8,
    poll_interval: Duration,
    max_polls: Option<u32>,
    operation: Option<Operation>,
}

impl VideoGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_VIDEO_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            prompt: None,
            negative_prompt: None,
            seed_image: None,
            aspect_ratio: "16:9".to_string(),
            person_generation: PersonGeneration::AllowAdult,
            number_of_videos: 1,
            duration_seconds: 5,
            poll_interval: Duration::from_secs(20),
            max_polls: None,
            operation: None,
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

    /// Model used to describe uploaded images.
    pub fn update_text_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        if !model.trim().is_empty() {
            self.text_model = model;
        }
    }

    pub fn update_contents(&mut self, prompt: impl Into<String>) {
        self.prompt = Some(prompt.into());
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// What the clip should avoid.
    pub fn update_negative_contents(&mut self, negative: impl Into<String>) {
        self.negative_prompt = Some(negative.into());
    }

    pub fn negative_prompt(&self) -> Option<&str> {
        self.negative_prompt.as_deref()
    }

    /// Use an image as the first frame. The text model is asked to describe it.
    pub async fn upload_image(&mut self, path: impl AsRef<Path>) -> Result<&SeedImage> {
        let image = LocalImage::open(path)?;
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                image.to_part(),
                Part::text(DESCRIBE_IMAGE_PROMPT),
            ])],
            ..Default::default()
        };
        let response = self
            .client
            .generate_content(&self.text_model, &request)
            .await?;
        let description = response.text();
        debug!(path = %image.path.display(), description = %description, "Seed image described");
        Ok(&*self.seed_image.insert(SeedImage { image, description }))
    }

    pub fn seed_image(&self) -> Option<&SeedImage> {
        self.seed_image.as_ref()
    }

    pub fn clear_image(&mut self) {
        self.seed_image = None;
    }

    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, ratio: &str) -> Result<()> {
        if !VIDEO_ASPECT_RATIOS.contains(&ratio) {
            return Err(GeminiError::InvalidParameter(format!(
                "unsupported aspect ratio {ratio}, expected one of {VIDEO_ASPECT_RATIOS:?}"
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

    /// Allow people of every age. Image-to-video does not support it, so the seed
    /// image is dropped.
    pub fn enable_all_person_generation(&mut self) {
        self.person_generation = PersonGeneration::AllowAll;
        self.seed_image = None;
    }

    pub fn number_of_videos(&self) -> u8 {
        self.number_of_videos
    }

    pub fn set_number_of_videos(&mut self, n: u8) -> Result<()> {
        if !(1..=2).contains(&n) {
            return Err(GeminiError::InvalidParameter(format!(
                "number_of_videos must be 1 or 2, got {n}"
            )));
        }
        self.number_of_videos = n;
        Ok(())
    }

    pub fn duration_seconds(&self) -> u8 {
        self.duration_seconds
    }

    /// Clip length, 5 to 8 seconds.
    pub fn set_duration(&mut self, seconds: u8) -> Result<()> {
        if !(5..=8).contains(&seconds) {
            return Err(GeminiError::InvalidParameter(format!(
                "duration must be between 5 and 8 seconds, got {seconds}"
            )));
        }
        self.duration_seconds = seconds;
        Ok(())
    }

    pub fn wait_time(&self) -> Duration {
        self.poll_interval
    }

    /// Seconds between operation polls (at least 1).
    pub fn set_wait_time(&mut self, seconds: u64) -> Result<()> {
        if seconds < 1 {
            return Err(GeminiError::InvalidParameter(
                "wait time must be at least 1 second".to_string(),
            ));
        }
        self.poll_interval = Duration::from_secs(seconds);
        Ok(())
    }

    /// Sub-second poll interval, for local mock servers.
    pub fn set_poll_interval(&mut self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(GeminiError::InvalidParameter(
                "poll interval must be non-zero".to_string(),
            ));
        }
        self.poll_interval = interval;
        Ok(())
    }

    /// Give up after `polls` status checks; `None` waits indefinitely.
    pub fn set_max_polls(&mut self, polls: Option<u32>) {
        self.max_polls = polls;
    }

    pub(crate) fn build_body(&self) -> Result<serde_json::Value> {
        let prompt = self
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| GeminiError::InvalidInput("no prompt set".to_string()))?;

        let mut instance = json!({ "prompt": prompt });
        if let Some(seed) = &self.seed_image {
            let blob = seed.image.to_blob();
            instance["image"] = json!({
                "bytesBase64Encoded": blob.data,
                "mimeType": blob.mime_type,
            });
        }

        let mut parameters = json!({
            "aspectRatio": self.aspect_ratio,
            "personGeneration": self.person_generation.as_str(),
            "sampleCount": self.number_of_videos,
            "durationSeconds": self.duration_seconds,
        });
        if let Some(negative) = &self.negative_prompt {
            parameters["negativePrompt"] = json!(negative);
        }

        Ok(json!({
            "instances": [instance],
            "parameters": parameters,
        }))
    }

    /// Start generation and wait until the operation completes.
    pub async fn generate(&mut self) -> Result<&Operation> {
        let body = self.build_body()?;
        let mut operation = self
            .client
            .predict_long_running(&self.model, &body)
            .await?;
        info!(model = %self.model, operation = %operation.name, "Video generation started");

        let mut polls = 0u32;
        while !operation.done {
            if let Some(max) = self.max_polls
                && polls >= max
            {
                self.operation = Some(operation.clone());
                return Err(GeminiError::TimeoutError(format!(
                    "operation {} not done after {polls} polls",
                    operation.name
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;
            operation = self.client.get_operation(&operation.name).await?;
            debug!(operation = %operation.name, polls, done = operation.done, "Polled operation");
        }

        if let Some(err) = &operation.error {
            let code = err
                .code
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(500);
            let message = err
                .message
                .clone()
                .unwrap_or_else(|| "Video generation failed".to_string());
            self.operation = Some(operation);
            return Err(GeminiError::api_error(code, message));
        }

        info!(operation = %operation.name, polls, "Video generation finished");
        Ok(&*self.operation.insert(operation))
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    /// URIs of the generated clips.
    pub fn videos(&self) -> Vec<String> {
        self.operation
            .as_ref()
            .and_then(|op| op.response.as_ref())
            .map(extract_video_uris)
            .unwrap_or_default()
    }

    /// Download every clip to `video{n}.mp4` in the output directory.
    pub async fn save_videos(&self) -> Result<Vec<PathBuf>> {
        let uris = self.videos();
        if uris.is_empty() {
            return Err(GeminiError::MissingResponse(
                "no generated videos to save".to_string(),
            ));
        }
        let output = self.client.output_dir();
        let mut saved = Vec::with_capacity(uris.len());
        for uri in uris {
            let bytes = self.client.download(&uri).await?;
            saved.push(output.write_next("video", "mp4", &bytes)?);
        }
        Ok(saved)
    }
}

fn extract_video_uris(response: &serde_json::Value) -> Vec<String> {
    let samples = response
        .pointer("/generateVideoResponse/generatedSamples")
        .or_else(|| response.pointer("/generatedVideos"))
        .and_then(|v| v.as_array());
    let Some(samples) = samples else {
        return Vec::new();
    };
    samples
        .iter()
        .filter_map(|sample| {
            sample
                .pointer("/video/uri")
                .or_else(|| sample.pointer("/videoUri"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .collect()
}
