//! Shared helpers for the mock-server tests.
#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gemini_studio::{GeminiClient, GeminiConfig};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::Path;
use wiremock::MockServer;

pub const TEST_KEY: &str = "test-key";

/// Client pointed at `server`, writing generated files to `output`.
pub fn client(server: &MockServer, output: &Path) -> GeminiClient {
    GeminiClient::new(
        GeminiConfig::new(TEST_KEY)
            .with_base_url(server.uri())
            .with_output_dir(output),
    )
    .expect("client")
}

/// `generateContent` body with one text candidate.
pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 7, "totalTokenCount": 11 }
    })
}

/// `generateContent` body with one inline data part.
pub fn inline_response(mime_type: &str, bytes: &[u8]) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "inlineData": { "mimeType": mime_type, "data": STANDARD.encode(bytes) } }]
            }
        }]
    })
}

/// A 4x4 solid PNG.
pub fn png_bytes() -> Vec<u8> {
    let image = ImageBuffer::from_pixel(4, 4, Rgb([10u8, 200, 30]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).expect("png");
    bytes.into_inner()
}

/// Little-endian 16-bit PCM.
pub fn pcm16(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Parsed JSON body of a received request.
pub fn body_json(request: &wiremock::Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}
