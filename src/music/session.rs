//! Bidirectional realtime music session.
//!
//! The client sends a `setup` message, waits for `setupComplete`, then steers the
//! model with weighted prompts, generation config and playback controls. Audio
//! arrives as base64 16-bit PCM chunks which a reader task decodes into
//! [`AudioFrame`]s.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::config::{MusicGenerationConfig, WeightedPrompt};
use super::sink::AudioFrame;
use crate::error::{GeminiError, Result};
use crate::speech::wav::pcm16_to_f32;

pub const MUSIC_ENDPOINT: &str =
    "ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateMusic";

const SETUP_TIMEOUT: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackControl {
    Play,
    Pause,
    Stop,
    ResetContext,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    #[serde(default)]
    setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    server_content: Option<ServerContent>,
    #[serde(default)]
    filtered_prompt: Option<FilteredPrompt>,
    #[serde(default)]
    warning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    #[serde(default)]
    audio_chunks: Vec<AudioChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioChunk {
    data: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilteredPrompt {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    filtered_reason: Option<String>,
}

/// Channel count and rate assumed when a chunk does not state them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
        }
    }
}

/// Cloneable handle for sending prompts, config and playback controls.
#[derive(Clone)]
pub struct MusicController {
    session_id: Uuid,
    writer: Arc<Mutex<WsWriter>>,
}

impl MusicController {
    async fn send_json(&self, value: serde_json::Value) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.send(Message::text(value.to_string())).await?;
        Ok(())
    }

    pub async fn set_weighted_prompts(&self, prompts: &[WeightedPrompt]) -> Result<()> {
        if prompts.is_empty() {
            return Err(GeminiError::InvalidInput(
                "at least one weighted prompt is required".to_string(),
            ));
        }
        debug!(session_id = %self.session_id, prompts = prompts.len(), "Sending weighted prompts");
        self.send_json(json!({ "clientContent": { "weightedPrompts": prompts } }))
            .await
    }

    pub async fn set_music_generation_config(&self, config: &MusicGenerationConfig) -> Result<()> {
        config.validate()?;
        debug!(session_id = %self.session_id, bpm = config.bpm, scale = %config.scale, "Sending generation config");
        self.send_json(json!({ "musicGenerationConfig": config }))
            .await
    }

    pub async fn playback(&self, control: PlaybackControl) -> Result<()> {
        debug!(session_id = %self.session_id, control = ?control, "Playback control");
        self.send_json(json!({ "playbackControl": control })).await
    }

    pub async fn play(&self) -> Result<()> {
        self.playback(PlaybackControl::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.playback(PlaybackControl::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.playback(PlaybackControl::Stop).await
    }

    /// Drop the model's context; needed for `bpm` and `scale` changes to take effect.
    pub async fn reset_context(&self) -> Result<()> {
        self.playback(PlaybackControl::ResetContext).await
    }
}

impl std::fmt::Debug for MusicController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicController")
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// An open music session. Frames are read by a background task and buffered
/// without limit until [`MusicSession::next_frame`] takes them.
pub struct MusicSession {
    controller: MusicController,
    frames: mpsc::UnboundedReceiver<Result<AudioFrame>>,
    cancel: CancellationToken,
    reader: Option<JoinHandle<()>>,
}

impl MusicSession {
    /// Connect to `url`, send the setup message for `model` and wait for the server
    /// to acknowledge it.
    pub async fn connect(url: &str, model: &str, format: StreamFormat) -> Result<Self> {
        let session_id = Uuid::new_v4();
        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (mut writer, mut reader) = stream.split();

        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        writer
            .send(Message::text(
                json!({ "setup": { "model": model } }).to_string(),
            ))
            .await?;

        tokio::time::timeout(SETUP_TIMEOUT, wait_for_setup(&mut reader))
            .await
            .map_err(|_| {
                GeminiError::TimeoutError("music session setup was not acknowledged".to_string())
            })??;
        info!(session_id = %session_id, model = %model, "Music session opened");

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let reader = tokio::spawn(read_loop(reader, tx, cancel.clone(), format, session_id));

        Ok(Self {
            controller: MusicController {
                session_id,
                writer: Arc::new(Mutex::new(writer)),
            },
            frames: rx,
            cancel,
            reader: Some(reader),
        })
    }

    pub fn id(&self) -> Uuid {
        self.controller.session_id
    }

    pub fn controller(&self) -> MusicController {
        self.controller.clone()
    }

    pub async fn set_weighted_prompts(&self, prompts: &[WeightedPrompt]) -> Result<()> {
        self.controller.set_weighted_prompts(prompts).await
    }

    pub async fn set_music_generation_config(&self, config: &MusicGenerationConfig) -> Result<()> {
        self.controller.set_music_generation_config(config).await
    }

    pub async fn play(&self) -> Result<()> {
        self.controller.play().await
    }

    pub async fn pause(&self) -> Result<()> {
        self.controller.pause().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.controller.stop().await
    }

    pub async fn reset_context(&self) -> Result<()> {
        self.controller.reset_context().await
    }

    /// Next decoded frame; `None` once the server closed the stream.
    pub async fn next_frame(&mut self) -> Option<Result<AudioFrame>> {
        self.frames.recv().await
    }

    /// Stop the reader task and close the socket.
    pub async fn close(mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(reader) = self.reader.take() {
            join_reader(reader, self.controller.session_id).await;
        }
        let mut writer = self.controller.writer.lock().await;
        if let Err(e) = writer.close().await {
            debug!(session_id = %self.controller.session_id, error = %e, "Socket already closed");
        }
        info!(session_id = %self.controller.session_id, "Music session closed");
        Ok(())
    }
}

impl Drop for MusicSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for MusicSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicSession")
            .field("session_id", &self.controller.session_id)
            .finish()
    }
}

async fn wait_for_setup(reader: &mut WsReader) -> Result<()> {
    while let Some(message) = reader.next().await {
        let message = message?;
        if let Message::Close(frame) = &message {
            return Err(GeminiError::WebSocketError(format!(
                "session closed during setup: {}",
                frame
                    .as_ref()
                    .map(|f| f.reason.as_str().to_owned())
                    .unwrap_or_default()
            )));
        }
        if let Some(parsed) = parse_message(&message)?
            && parsed.setup_complete.is_some()
        {
            return Ok(());
        }
    }
    Err(GeminiError::WebSocketError(
        "session closed before setup completed".to_string(),
    ))
}

async fn join_reader(reader: JoinHandle<()>, session_id: Uuid) {
    if let Err(e) = reader.await {
        warn!(session_id = %session_id, error = %e, "Music reader task failed");
    }
}

async fn read_loop(
    mut reader: WsReader,
    tx: mpsc::UnboundedSender<Result<AudioFrame>>,
    cancel: CancellationToken,
    format: StreamFormat,
    session_id: Uuid,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = reader.next() => message,
        };
        let message = match message {
            None => break,
            Some(Err(e)) => {
                let _ = tx.send(Err(e.into()));
                break;
            }
            Some(Ok(Message::Close(frame))) => {
                debug!(session_id = %session_id, frame = ?frame, "Server closed music session");
                break;
            }
            Some(Ok(message)) => message,
        };

        let parsed = match parse_message(&message) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Ignoring malformed server message");
                continue;
            }
        };

        if let Some(filtered) = &parsed.filtered_prompt {
            warn!(
                session_id = %session_id,
                prompt = filtered.text.as_deref().unwrap_or_default(),
                reason = filtered.filtered_reason.as_deref().unwrap_or_default(),
                "Prompt filtered"
            );
        }
        if let Some(warning) = &parsed.warning {
            warn!(session_id = %session_id, warning = %warning, "Music session warning");
        }

        for chunk in parsed
            .server_content
            .map(|content| content.audio_chunks)
            .unwrap_or_default()
        {
            if tx.send(decode_chunk(&chunk, format)).is_err() {
                return;
            }
        }
    }
    debug!(session_id = %session_id, "Music reader stopped");
}

fn parse_message(message: &Message) -> Result<Option<ServerMessage>> {
    let parsed = match message {
        Message::Text(text) => serde_json::from_str(text.as_str())?,
        Message::Binary(bytes) => serde_json::from_slice(bytes)?,
        _ => return Ok(None),
    };
    Ok(Some(parsed))
}

fn decode_chunk(chunk: &AudioChunk, fallback: StreamFormat) -> Result<AudioFrame> {
    let pcm = STANDARD.decode(chunk.data.as_bytes())?;
    let format = chunk
        .mime_type
        .as_deref()
        .map(|mime| parse_pcm_mime(mime, fallback))
        .unwrap_or(fallback);
    Ok(AudioFrame {
        samples: pcm16_to_f32(&pcm),
        channels: format.channels,
        sample_rate: format.sample_rate,
    })
}

/// Read `rate=` and `channels=` from a mime type like `audio/l16;rate=48000;channels=2`.
fn parse_pcm_mime(mime: &str, fallback: StreamFormat) -> StreamFormat {
    let mut format = fallback;
    for param in mime.split(';').skip(1) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "rate" => {
                if let Ok(rate) = value.trim().parse() {
                    format.sample_rate = rate;
                }
            }
            "channels" => {
                if let Ok(channels) = value.trim().parse() {
                    format.channels = channels;
                }
            }
            _ => {}
        }
    }
    format
}
