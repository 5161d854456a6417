//! # Gemini Studio
//!
//! Convenience wrappers over the Gemini API for text, images, video, speech and
//! realtime music. Each wrapper keeps its own settings and last response and
//! exposes small setters that validate their input.
//!
#![deny(unsafe_code)]

//! ## Quick Start
//!
//! ```rust,no_run
//! use gemini_studio::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GeminiError> {
//!     let mut studio = GeminiStudio::from_env()?;
//!
//!     studio.text.update_contents("Explain how a rainbow forms in two sentences.");
//!     studio.text.generate().await?;
//!     studio.text.display_response();
//!
//!     studio.imagen.update_contents("A lighthouse on a cliff at dusk");
//!     studio.imagen.generate().await?;
//!     studio.imagen.save_images()?;
//!
//!     studio.single_speaker.update_contents("Say cheerfully: have a wonderful day!");
//!     studio.single_speaker.generate().await?;
//!     studio.single_speaker.save_response()?;
//!     Ok(())
//! }
//! ```
//!
//! Generated files land in `Output/` (see [`config::GeminiConfig::output_dir`]) with
//! numbered names such as `new_image3.jpg`, `video4.mp4` and `out5.wav`.

pub mod client;
pub mod config;
pub mod error;
pub mod image_edit;
pub mod imagen;
pub mod media;
pub mod music;
pub mod output;
#[cfg(feature = "playback")]
pub mod playback;
pub mod retry;
pub mod speech;
pub mod studio;
pub mod telemetry;
pub mod text;
pub mod types;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use error::{GeminiError, Result};
pub use studio::GeminiStudio;

pub mod prelude {
    pub use crate::client::GeminiClient;
    pub use crate::config::{GeminiConfig, HttpConfig};
    pub use crate::error::{GeminiError, Result};
    pub use crate::image_edit::ImageEditor;
    pub use crate::imagen::{GeneratedImage, ImageGenerator};
    pub use crate::music::{
        AudioFrame, AudioSink, BufferSink, MusicGenerationConfig, MusicGenerator, Scale,
        WavSink, WeightedPrompt,
    };
    #[cfg(feature = "playback")]
    pub use crate::playback::Speaker;
    pub use crate::retry::RetryOptions;
    pub use crate::speech::{AudioFormat, MultiSpeaker, SingleSpeaker, Speech};
    pub use crate::studio::GeminiStudio;
    pub use crate::telemetry::{TelemetryConfig, init_subscriber};
    pub use crate::text::{ChatSession, TextGenerator};
    pub use crate::types::PersonGeneration;
    pub use crate::video::VideoGenerator;
}
