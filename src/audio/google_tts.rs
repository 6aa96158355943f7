//! Speech from the Google Translate TTS endpoint.
//!
//! The endpoint reads at most ~100 characters per request, so text is split
//! on punctuation and the returned MP3 frames are concatenated.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::tts::SpeechProvider;
use super::types::SpeechRequest;
use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::language::Language;
use crate::provider::http::{content_type, shared_client, status_to_error, trim_trailing_slash};
use crate::util::retry::RetryPolicy;
use crate::util::text::split_into_chunks;
use crate::util::timeout::with_timeout;

pub const GOOGLE_TTS_BASE_URL: &str = "https://translate.google.com";
const MAX_CHUNK_CHARS: usize = 100;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GoogleTtsProvider {
    base_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl Default for GoogleTtsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTtsProvider {
    pub fn new() -> Self {
        Self {
            base_url: GOOGLE_TTS_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
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

    pub fn from_config(config: &FarmGuideConfig) -> Self {
        match config.get_base_url("tts") {
            Some(url) => Self::new().with_base_url(url),
            None => Self::new(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: Language,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, FarmGuideError> {
        let url = format!("{}/translate_tts", trim_trailing_slash(&self.base_url));
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        with_timeout(self.timeout, async {
            let response = shared_client()
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk),
                    ("tl", language.code()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error(status, &body));
            }

            let ct = content_type(&response);
            if !ct.starts_with("audio/") {
                return Err(FarmGuideError::InvalidState(format!(
                    "Unexpected speech response MIME type '{ct}'"
                )));
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(FarmGuideError::InvalidState(
                    "Speech response contained empty audio payload".to_string(),
                ));
            }
            Ok(bytes.to_vec())
        })
        .await
    }
}

#[async_trait]
impl SpeechProvider for GoogleTtsProvider {
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<Vec<u8>, FarmGuideError> {
        if !self.supports(request.language) {
            return Err(FarmGuideError::UnsupportedLanguage(format!(
                "no speech voice for '{}'",
                request.language
            )));
        }
        let chunks = split_into_chunks(&request.text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(FarmGuideError::InvalidArgument(
                "Speech text cannot be empty".to_string(),
            ));
        }

        debug!(chunks = chunks.len(), language = %request.language, "google tts");
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self
                .retry_policy
                .execute(|| self.fetch_chunk(chunk, request.language, idx, chunks.len()))
                .await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }

    fn supports(&self, language: Language) -> bool {
        matches!(language, Language::En | Language::Ur)
    }
}
