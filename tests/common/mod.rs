//! Shared test helpers and mock collaborators.
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use farmguide::agent::{AgentConfig, AgentRuntime};
use farmguide::audio::{AudioProvider, SpeechProvider, SpeechRequest, SpeechSynthesizer, TranscriptionResult};
use farmguide::error::FarmGuideError;
use farmguide::language::Language;
use farmguide::models::ModelCapabilities;
use farmguide::pipeline::{PipelineCoordinator, RuntimeFactory};
use farmguide::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use farmguide::tools::{SearchHit, SearchOutcome, SearchProvider, SearchTool, Tool};
use farmguide::translate::Translator;
use farmguide::types::*;
use farmguide::util::retry::RetryPolicy;

pub fn test_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

/// A mock provider that returns queued responses and records requests.
pub struct MockProvider {
    capabilities: ModelCapabilities,
    responses: Mutex<Vec<Result<ProviderResponse, FarmGuideError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            capabilities: ModelCapabilities::tool_chat(128_000),
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn without_tools() -> Self {
        Self {
            capabilities: ModelCapabilities::default(),
            ..Self::new()
        }
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push(Ok(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        }));
    }

    /// Queue a response requesting one search per query.
    pub fn queue_searches(&self, queries: &[&str]) {
        let tool_calls = queries
            .iter()
            .enumerate()
            .map(|(i, q)| AgentToolCall {
                id: format!("call_{i}"),
                name: "web_search_tool".to_string(),
                arguments: serde_json::json!({ "query": q }),
            })
            .collect();
        self.responses.lock().unwrap().push(Ok(ProviderResponse {
            tool_calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Default::default()
        }));
    }

    pub fn queue_error(&self, err: FarmGuideError) {
        self.responses.lock().unwrap().push(Err(err));
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, FarmGuideError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(FarmGuideError::InvalidState("no queued response".into()));
        }
        responses.remove(0)
    }
}

/// Search backend with a fixed outcome.
pub struct MockSearch {
    outcome: Result<SearchOutcome, String>,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn hits(hits: Vec<SearchHit>) -> Self {
        Self::with(Ok(SearchOutcome::Results(hits)))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Err(message.to_string()))
    }

    fn with(outcome: Result<SearchOutcome, String>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, _max_results: u32) -> Result<SearchOutcome, FarmGuideError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        self.outcome
            .clone()
            .map_err(|m| FarmGuideError::provider("tavily", m))
    }
}

pub fn urea_hit() -> SearchHit {
    SearchHit {
        url: "https://agri.example/urea".into(),
        title: "Urea fertilizer".into(),
        content: "Urea contains 46% nitrogen.".into(),
    }
}

/// Translator that tags text with the target code, or always fails.
pub struct MockTranslator {
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockTranslator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, FarmGuideError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FarmGuideError::api(503, "translate unavailable"));
        }
        if source == target {
            return Ok(text.to_string());
        }
        Ok(format!("[{target}] {text}"))
    }
}

/// Speech provider that returns fixed bytes and records requests.
pub struct MockSpeech {
    fail: bool,
    pub requests: Mutex<Vec<SpeechRequest>>,
}

impl MockSpeech {
    pub fn ok() -> Self {
        Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn languages(&self) -> Vec<Language> {
        self.requests.lock().unwrap().iter().map(|r| r.language).collect()
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<Vec<u8>, FarmGuideError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(FarmGuideError::api(500, "tts down"));
        }
        Ok(b"ID3fake-mp3".to_vec())
    }

    fn supports(&self, language: Language) -> bool {
        language != Language::Sd
    }
}

/// Transcriber with a fixed result.
pub struct MockTranscriber {
    result: Result<String, FarmGuideError>,
    pub hints: Mutex<Vec<Option<String>>>,
}

impl MockTranscriber {
    pub fn text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            hints: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(FarmGuideError::api(500, "asr down")),
            hints: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AudioProvider for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _mime_type: &str,
        language: Option<&str>,
    ) -> Result<TranscriptionResult, FarmGuideError> {
        self.hints.lock().unwrap().push(language.map(str::to_string));
        match &self.result {
            Ok(text) => Ok(TranscriptionResult {
                text: text.clone(),
                language: language.map(str::to_string),
                duration_seconds: None,
            }),
            Err(_) => Err(FarmGuideError::api(500, "asr down")),
        }
    }
}

/// Runtime over a mock provider and the real search tool on `search`.
pub fn runtime(provider: Arc<MockProvider>, search: Arc<MockSearch>) -> AgentRuntime {
    let tool: Arc<dyn Tool> = Arc::new(SearchTool::new(search));
    AgentRuntime::from_parts(provider, vec![tool], AgentConfig::default()).unwrap()
}

/// Coordinator whose runtime factory always hands out runtimes over
/// `provider` and `search`.
pub fn coordinator(
    provider: Arc<MockProvider>,
    search: Arc<MockSearch>,
    translator: Arc<MockTranslator>,
    speech: Arc<MockSpeech>,
    output_dir: &Path,
) -> PipelineCoordinator {
    let factory: RuntimeFactory = Arc::new(move || Ok(runtime(provider.clone(), search.clone())));
    PipelineCoordinator::new(
        factory,
        translator,
        SpeechSynthesizer::new(speech, output_dir, "response"),
    )
}
