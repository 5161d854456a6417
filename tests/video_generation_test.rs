//! Veo long-running operations: start, poll, download.

mod support;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gemini_studio::prelude::*;
use serde_json::json;
use std::time::Duration;
use support::{body_json, client};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const OPERATION: &str = "models/veo-2.0-generate-001/operations/op-123";

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/models/veo-2.0-generate-001:predictLongRunning"))
        .and(|req: &Request| {
            let body = body_json(req);
            body["instances"][0]["prompt"] == json!("Panning wide shot of a calico kitten")
                && body["parameters"]["durationSeconds"] == json!(6)
                && body["parameters"]["negativePrompt"] == json!("dogs")
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .expect(1)
        .mount(server)
        .await;
}

fn generator(server: &MockServer, output: &std::path::Path) -> VideoGenerator {
    let mut video = VideoGenerator::new(client(server, output));
    video.update_contents("Panning wide shot of a calico kitten");
    video.update_negative_contents("dogs");
    video.set_duration(6).unwrap();
    video.set_poll_interval(Duration::from_millis(10)).unwrap();
    video
}

#[tokio::test]
async fn polls_until_done_then_downloads_each_clip() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION, "done": false })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [
                        { "video": { "uri": format!("{}/files/a:download", server.uri()) } },
                        { "video": { "uri": format!("{}/files/b:download", server.uri()) } }
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a:download"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"clip-a".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b:download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"clip-b".to_vec()))
        .mount(&server)
        .await;

    let mut video = generator(&server, tmp.path());
    let operation = video.generate().await.unwrap();
    assert!(operation.done);
    assert_eq!(video.videos().len(), 2);

    let saved = video.save_videos().await.unwrap();
    assert_eq!(saved[0].file_name().unwrap(), "video0.mp4");
    assert_eq!(saved[1].file_name().unwrap(), "video1.mp4");
    assert_eq!(std::fs::read(&saved[1]).unwrap(), b"clip-b");
}

#[tokio::test]
async fn max_polls_turns_into_timeout() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .expect(3)
        .mount(&server)
        .await;

    let mut video = generator(&server, tmp.path());
    video.set_max_polls(Some(3));
    assert!(matches!(
        video.generate().await,
        Err(GeminiError::TimeoutError(_))
    ));
    assert!(video.videos().is_empty());
}

#[tokio::test]
async fn failed_operation_is_an_api_error() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "error": { "code": 3, "message": "prompt rejected" }
        })))
        .mount(&server)
        .await;

    let mut video = generator(&server, tmp.path());
    let err = video.generate().await.unwrap_err();
    assert_eq!(err.status_code(), Some(3));
    assert!(err.to_string().contains("prompt rejected"));
}

#[tokio::test]
async fn seed_image_is_described_and_sent() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let seed = tmp.path().join("seed.png");
    std::fs::write(&seed, support::png_bytes()).unwrap();

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(|req: &Request| {
            body_json(req)["contents"][0]["parts"][1]["text"] == json!("What is this image?")
        })
        .respond_with(
            ResponseTemplate::new(200).set_body_json(support::text_response("A green square.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/models/veo-2.0-generate-001:predictLongRunning"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION, "done": true })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut video = generator(&server, tmp.path());
    let described = video.upload_image(&seed).await.unwrap();
    assert_eq!(described.description, "A green square.");
    video.generate().await.unwrap();

    video.enable_all_person_generation();
    assert!(video.seed_image().is_none());
    video.generate().await.unwrap();

    let starts: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| req.url.path().ends_with(":predictLongRunning"))
        .map(|req| body_json(&req))
        .collect();
    assert_eq!(starts.len(), 2);

    let image = &starts[0]["instances"][0]["image"];
    assert_eq!(image["mimeType"], json!("image/png"));
    assert_eq!(
        image["bytesBase64Encoded"],
        json!(STANDARD.encode(support::png_bytes()))
    );
    assert_eq!(starts[0]["parameters"]["personGeneration"], json!("allow_adult"));

    assert!(starts[1]["instances"][0].get("image").is_none());
    assert_eq!(starts[1]["parameters"]["personGeneration"], json!("allow_all"));
}
