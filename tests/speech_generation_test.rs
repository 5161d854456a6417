//! Text to speech: request shape and WAV output.

mod support;

use gemini_studio::prelude::*;
use serde_json::json;
use support::{body_json, client, inline_response, pcm16};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TTS_PATH: &str = "/models/gemini-2.5-flash-preview-tts:generateContent";

#[tokio::test]
async fn single_speaker_saves_numbered_wav() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .and(|req: &Request| {
            let config = &body_json(req)["generationConfig"];
            config["responseModalities"] == json!(["AUDIO"])
                && config["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"]
                    == json!("Charon")
                && config["speechConfig"]["languageCode"] == json!("de-DE")
        })
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(inline_response("audio/L16;codec=pcm;rate=24000", &pcm16(&[0, 1000, -1000, 32767]))),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut tts = SingleSpeaker::new(client(&server, tmp.path()));
    tts.set_voice("Charon").unwrap();
    tts.set_language("de-DE").unwrap();
    tts.update_contents("Say warmly: Guten Morgen!");
    tts.generate().await.unwrap();

    let first = tts.save_response().unwrap();
    assert_eq!(first.file_name().unwrap(), "out0.wav");

    let reader = hound::WavReader::open(&first).unwrap();
    assert_eq!(reader.spec().sample_rate, 24000);
    assert_eq!(reader.spec().channels, 1);
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![0, 1000, -1000, 32767]);

    tts.generate().await.unwrap();
    let second = tts.save_response().unwrap();
    assert_eq!(second.file_name().unwrap(), "out1.wav");

    let floats = tts.pcm_samples().unwrap();
    assert_eq!(floats.len(), 4);
    assert_eq!(floats[0], 0.0);
}

#[tokio::test]
async fn multi_speaker_sends_both_voices() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .and(|req: &Request| {
            let body = body_json(req);
            let configs = &body["generationConfig"]["speechConfig"]["multiSpeakerVoiceConfig"]
                ["speakerVoiceConfigs"];
            body["contents"][0]["parts"][0]["text"]
                == json!("TTS the following conversation between Joe and Jane:, Joe: Hi Jane!, Jane: Hi Joe!")
                && configs[0]["speaker"] == json!("Joe")
                && configs[1]["speaker"] == json!("Jane")
                && configs[1]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"] == json!("Kore")
                && body["generationConfig"]["speechConfig"].get("languageCode").is_none()
        })
        .respond_with(
            ResponseTemplate::new(200).set_body_json(inline_response("audio/L16", &pcm16(&[5, 6]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut tts = MultiSpeaker::new(client(&server, tmp.path()));
    tts.set_speaker_name(0, "Joe").unwrap();
    tts.set_speaker_name(1, "Jane").unwrap();
    tts.update_contents("TTS the following conversation between Joe and Jane:");
    tts.update_contents("Joe: Hi Jane!");
    tts.update_contents("Jane: Hi Joe!");
    tts.generate().await.unwrap();

    tts.set_sample_width(1).unwrap();
    tts.set_channels(2).unwrap();
    let path = tts.save_response().unwrap();
    let spec = hound::WavReader::open(path).unwrap().spec();
    assert_eq!(spec.bits_per_sample, 8);
    assert_eq!(spec.channels, 2);
}

#[tokio::test]
async fn odd_sample_count_saves_as_stereo() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(inline_response("audio/L16", &pcm16(&[1, 2, 3]))),
        )
        .mount(&server)
        .await;

    let mut tts = SingleSpeaker::new(client(&server, tmp.path()));
    tts.update_contents("Say hi");
    tts.generate().await.unwrap();
    tts.set_channels(2).unwrap();

    let saved = tts.save_response().unwrap();
    let reader = hound::WavReader::open(&saved).unwrap();
    assert_eq!(reader.spec().channels, 2);
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![1, 2, 3, 0]);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn response_without_audio_is_missing_response() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::text_response("no audio")))
        .mount(&server)
        .await;

    let mut tts = SingleSpeaker::new(client(&server, tmp.path()));
    tts.update_contents("Say hi");
    tts.generate().await.unwrap();
    assert!(matches!(
        tts.save_response(),
        Err(GeminiError::MissingResponse(_))
    ));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}
