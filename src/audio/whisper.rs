//! Whisper transcription over an OpenAI-compatible `/audio/transcriptions`
//! endpoint (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::helpers::{build_transcription_multipart, normalize_mime_type};
use super::transcription::AudioProvider;
use super::types::{AudioFormat, TranscriptionResult};
use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::provider::groq::GROQ_BASE_URL;
use crate::provider::http::{bearer_headers, content_type, shared_client, status_to_error, trim_trailing_slash};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

pub const DEFAULT_WHISPER_MODEL: &str = "whisper-large-v3";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct WhisperTranscriptionProvider {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl WhisperTranscriptionProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GROQ_BASE_URL.to_string(),
            model: DEFAULT_WHISPER_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Uses the `groq` credentials and base URL plus the configured
    /// Whisper model.
    pub fn from_config(config: &FarmGuideConfig) -> Result<Self, FarmGuideError> {
        let api_key = config
            .get_api_key("groq")
            .ok_or_else(|| FarmGuideError::Authentication("Missing GROQ_API_KEY".into()))?;
        let mut provider = Self::new(api_key).with_model(config.settings().whisper_model.clone());
        if let Some(url) = config.get_base_url("groq") {
            provider = provider.with_base_url(url);
        }
        Ok(provider)
    }

    fn validate_inputs(&self, audio: &[u8], mime_type: &str) -> Result<(String, AudioFormat), FarmGuideError> {
        if audio.is_empty() {
            return Err(FarmGuideError::InvalidArgument(
                "Audio payload cannot be empty".to_string(),
            ));
        }
        let mime = normalize_mime_type(mime_type)
            .ok_or_else(|| FarmGuideError::InvalidArgument("MIME type cannot be empty".to_string()))?;
        let format = AudioFormat::from_mime(&mime).ok_or_else(|| {
            FarmGuideError::InvalidArgument(format!("Unsupported transcription MIME type: {mime}"))
        })?;
        Ok((mime, format))
    }

    async fn transcribe_once(
        &self,
        audio: &[u8],
        mime_type: &str,
        format: AudioFormat,
        language: Option<&str>,
    ) -> Result<TranscriptionResult, FarmGuideError> {
        let boundary = format!("farmguide-{}", Uuid::new_v4().simple());
        let body = build_transcription_multipart(
            &boundary,
            &self.model,
            audio,
            mime_type,
            format.extension(),
            language,
        );

        let mut headers = bearer_headers(&self.api_key);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}")).map_err(
                |e| FarmGuideError::InvalidArgument(format!("Failed to build multipart content-type: {e}")),
            )?,
        );

        let url = format!("{}/audio/transcriptions", trim_trailing_slash(&self.base_url));

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(headers)
                .body(body)
                .send()
                .await?;
            parse_transcription_response(response).await
        })
        .await
    }
}

#[async_trait]
impl AudioProvider for WhisperTranscriptionProvider {
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        language: Option<&str>,
    ) -> Result<TranscriptionResult, FarmGuideError> {
        let (mime, format) = self.validate_inputs(audio, mime_type)?;
        let language = language.map(str::trim).filter(|l| !l.is_empty());
        debug!(bytes = audio.len(), mime = %mime, ?language, model = %self.model, "transcribing");

        self.retry_policy
            .execute(|| self.transcribe_once(audio, &mime, format, language))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: String,
    language: Option<String>,
    duration: Option<f64>,
}

async fn parse_transcription_response(
    response: reqwest::Response,
) -> Result<TranscriptionResult, FarmGuideError> {
    let status = response.status().as_u16();
    if status != 200 {
        let body = response.text().await.unwrap_or_default();
        return Err(status_to_error(status, &body));
    }

    let ct = content_type(&response);
    if ct != "application/json" {
        return Err(FarmGuideError::InvalidState(format!(
            "Expected JSON transcription response, got '{ct}'"
        )));
    }

    let body = response.text().await?;
    let parsed: WhisperResponse = serde_json::from_str(&body)?;
    Ok(TranscriptionResult {
        text: parsed.text.trim().to_string(),
        language: parsed.language,
        duration_seconds: parsed.duration,
    })
}
