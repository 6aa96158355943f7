#![cfg(feature = "server")]

mod common;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use common::{coordinator, MockProvider, MockSearch, MockSpeech, MockTranscriber, MockTranslator};
use farmguide::agent::AgentRuntime;
use farmguide::audio::SpeechSynthesizer;
use farmguide::error::FarmGuideError;
use farmguide::language::Language;
use farmguide::pipeline::{PipelineCoordinator, RuntimeFactory};
use farmguide::server::{serve_listener, AppState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn(pipeline: PipelineCoordinator, audio_dir: &Path) -> SocketAddr {
    let state = AppState {
        pipeline: Arc::new(pipeline),
        default_language: Language::En,
        public_base_url: None,
        audio_dir: audio_dir.to_path_buf(),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_listener(listener, state));
    addr
}

fn answering(text: &str, dir: &Path) -> PipelineCoordinator {
    let provider = Arc::new(MockProvider::new());
    provider.queue_response(text);
    coordinator(
        provider,
        Arc::new(MockSearch::hits(vec![])),
        Arc::new(MockTranslator::ok()),
        Arc::new(MockSpeech::ok()),
        dir,
    )
}

#[tokio::test]
async fn health_reports_agent_readiness() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn(answering("ok", dir.path()), dir.path()).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok", "agent_ready": false}));
}

#[tokio::test]
async fn query_returns_answer_and_serves_audio() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn(answering("Apply after irrigation.", dir.path()), dir.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/query"))
        .json(&json!({
            "ocr_text": "DAP 18-46-0",
            "farmer_query": "When to apply?",
            "language": "ur",
            "session_id": "farmer-1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["response"], "Apply after irrigation.");
    assert_eq!(body["translated_response"], "[ur] Apply after irrigation۔");
    let audio_url = body["audio_url"].as_str().unwrap();
    assert!(audio_url.starts_with("/audio/response_ur_"), "{audio_url}");
    assert!(audio_url.ends_with(".mp3"));

    let audio = client
        .get(format!("http://{addr}{audio_url}"))
        .send()
        .await
        .unwrap();
    assert_eq!(audio.status(), 200);
    assert_eq!(audio.bytes().await.unwrap().as_ref(), b"ID3fake-mp3");
}

#[tokio::test]
async fn unknown_language_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn(answering("unused", dir.path()), dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/query"))
        .json(&json!({"farmer_query": "hi", "language": "fr"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("fr"));
}

#[tokio::test]
async fn runtime_failure_is_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let factory: RuntimeFactory =
        Arc::new(|| -> Result<AgentRuntime, FarmGuideError> {
            Err(FarmGuideError::Authentication("Missing GROQ_API_KEY".into()))
        });
    let pipeline = PipelineCoordinator::new(
        factory,
        Arc::new(MockTranslator::ok()),
        SpeechSynthesizer::new(Arc::new(MockSpeech::ok()), dir.path(), "response"),
    );
    let addr = spawn(pipeline, dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/query"))
        .json(&json!({"farmer_query": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn voice_endpoint_transcribes_then_answers() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = answering("Spray in the evening.", dir.path())
        .with_transcriber(Arc::new(MockTranscriber::text("when should I spray?")));
    let addr = spawn(pipeline, dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/voice?language=en&session_id=farmer-2"))
        .header("content-type", "audio/webm")
        .body(b"webm-bytes".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["transcript"], "when should I spray?");
    assert_eq!(body["response"], "Spray in the evening.");
    assert_eq!(body["translated_response"], "Spray in the evening.");
    assert!(body["audio_url"].as_str().unwrap().starts_with("/audio/response_en_"));
}

#[tokio::test]
async fn malformed_json_gets_error_body() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn(answering("unused", dir.path()), dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/query"))
        .header("content-type", "application/json")
        .body("{\"farmer_query\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid argument: "));
}

#[tokio::test]
async fn voice_without_transcriber_is_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn(answering("unused", dir.path()), dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/voice?language=ur"))
        .header("content-type", "audio/wav")
        .body(b"RIFF".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("transcription"));
}
