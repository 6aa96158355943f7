//! Pipeline coordinator: inputs → agent → translation → speech.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::agent::{build_conversation, combine_inputs, AgentConfig, AgentRuntime};
use crate::audio::{AudioProvider, GoogleTtsProvider, SpeechSynthesizer, WhisperTranscriptionProvider};
use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::language::Language;
use crate::translate::{GoogleTranslator, Translator};
use crate::util::text::preview;

/// Answer text used when the agent returns nothing.
pub const NO_ANSWER: &str = "No answer available.";

/// Builds an [`AgentRuntime`] on demand.
pub type RuntimeFactory = Arc<dyn Fn() -> Result<AgentRuntime, FarmGuideError> + Send + Sync>;

/// Outcome of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Agent answer in English.
    pub response: String,
    /// Answer in the requested language (same as `response` for English or
    /// when translation failed).
    pub translated_response: String,
    pub audio_path: Option<PathBuf>,
}

/// Outcome of a voice query: what was heard and the answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceQueryResult {
    pub transcript: String,
    #[serde(flatten)]
    pub result: PipelineResult,
}

pub struct PipelineCoordinator {
    factory: RuntimeFactory,
    runtime: Mutex<Option<Arc<AgentRuntime>>>,
    translator: Arc<dyn Translator>,
    synthesizer: SpeechSynthesizer,
    transcriber: Option<Arc<dyn AudioProvider>>,
    default_session: String,
}

impl PipelineCoordinator {
    pub fn new(
        factory: RuntimeFactory,
        translator: Arc<dyn Translator>,
        synthesizer: SpeechSynthesizer,
    ) -> Self {
        Self {
            factory,
            runtime: Mutex::new(None),
            translator,
            synthesizer,
            transcriber: None,
            default_session: crate::config::DEFAULT_SESSION_KEY.to_string(),
        }
    }

    /// Wire the Groq, Tavily and Google collaborators from `config`. The agent
    /// runtime is built on first use.
    pub fn from_config(config: &FarmGuideConfig) -> Self {
        let runtime_config = config.clone();
        let factory: RuntimeFactory = Arc::new(move || {
            AgentRuntime::new(
                &runtime_config,
                AgentConfig::from_settings(runtime_config.settings()),
            )
        });

        let translator = Arc::new(GoogleTranslator::from_config(config));
        let synthesizer =
            SpeechSynthesizer::from_config(Arc::new(GoogleTtsProvider::from_config(config)), config);

        let mut coordinator = Self::new(factory, translator, synthesizer)
            .with_default_session(config.settings().default_session.clone());
        match WhisperTranscriptionProvider::from_config(config) {
            Ok(whisper) => coordinator = coordinator.with_transcriber(Arc::new(whisper)),
            Err(e) => warn!(error = %e, "voice transcription disabled"),
        }
        coordinator
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn AudioProvider>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_default_session(mut self, session: impl Into<String>) -> Self {
        self.default_session = session.into();
        self
    }

    /// Whether the agent runtime has been built.
    pub async fn is_ready(&self) -> bool {
        self.runtime.lock().await.is_some()
    }

    /// The shared runtime, building it if needed. A failed build is retried
    /// once before giving up.
    pub async fn runtime(&self) -> Result<Arc<AgentRuntime>, FarmGuideError> {
        let mut slot = self.runtime.lock().await;
        if let Some(runtime) = slot.as_ref() {
            return Ok(runtime.clone());
        }

        let runtime = match (self.factory)() {
            Ok(runtime) => runtime,
            Err(first) => {
                warn!(error = %first, "agent runtime init failed; retrying");
                (self.factory)().map_err(|e| FarmGuideError::RuntimeUnavailable(e.to_string()))?
            }
        };
        let runtime = Arc::new(runtime);
        *slot = Some(runtime.clone());
        Ok(runtime)
    }

    pub async fn process_text_query(
        &self,
        ocr_text: &str,
        farmer_query: &str,
        language: Language,
    ) -> Result<PipelineResult, FarmGuideError> {
        self.process_text_query_in_session(ocr_text, farmer_query, language, None)
            .await
    }

    pub async fn process_text_query_in_session(
        &self,
        ocr_text: &str,
        farmer_query: &str,
        language: Language,
        session: Option<&str>,
    ) -> Result<PipelineResult, FarmGuideError> {
        let session = session
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.default_session.as_str());
        let conversation = build_conversation(combine_inputs(ocr_text, farmer_query));

        let runtime = self.runtime().await?;
        let answer = runtime.answer(&conversation, session).await;
        let response = if answer.trim().is_empty() {
            NO_ANSWER.to_string()
        } else {
            answer
        };
        info!(session, language = %language, answer = %preview(&response, 120), "agent answered");

        let translated_response = self.localize(&response, language).await;
        let audio_path = self.synthesizer.synthesize(&translated_response, language).await;

        Ok(PipelineResult {
            response,
            translated_response,
            audio_path,
        })
    }

    pub async fn process_voice_query(
        &self,
        transcript: &str,
        language: Language,
    ) -> Result<PipelineResult, FarmGuideError> {
        self.process_voice_query_in_session(transcript, language, None)
            .await
    }

    pub async fn process_voice_query_in_session(
        &self,
        transcript: &str,
        language: Language,
        session: Option<&str>,
    ) -> Result<PipelineResult, FarmGuideError> {
        self.process_text_query_in_session("", transcript, language, session)
            .await
    }

    /// Transcribe recorded audio, then answer it as a voice query.
    ///
    /// Malformed audio is rejected. A transcriber failure is treated as an
    /// empty query.
    pub async fn process_voice_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        language: Language,
        session: Option<&str>,
    ) -> Result<VoiceQueryResult, FarmGuideError> {
        let transcript = self.transcribe(audio, mime_type, language).await?;
        let result = self
            .process_voice_query_in_session(&transcript, language, session)
            .await?;
        Ok(VoiceQueryResult { transcript, result })
    }

    pub async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        language: Language,
    ) -> Result<String, FarmGuideError> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            FarmGuideError::Unavailable("no transcription provider configured".into())
        })?;
        match transcriber.transcribe(audio, mime_type, Some(language.code())).await {
            Ok(result) => {
                info!(transcript = %preview(&result.text, 120), "transcribed");
                Ok(result.text.trim().to_string())
            }
            Err(e @ FarmGuideError::InvalidArgument(_)) => Err(e),
            Err(e) => {
                warn!(error = %e, "transcription failed; using empty query");
                Ok(String::new())
            }
        }
    }

    /// Translate the English answer into `language`, falling back to the
    /// English text.
    async fn localize(&self, response: &str, language: Language) -> String {
        if language.is_pivot() {
            return response.to_string();
        }
        match self.translator.translate(response, Language::PIVOT, language).await {
            Ok(translated) if !translated.trim().is_empty() => {
                language.normalize_punctuation(&translated)
            }
            Ok(_) => response.to_string(),
            Err(e) => {
                warn!(language = %language, error = %e, "translation failed; keeping English");
                response.to_string()
            }
        }
    }
}
