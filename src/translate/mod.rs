//! Translation between supported languages.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::language::Language;
use crate::provider::http::{shared_client, status_to_error, trim_trailing_slash};
use crate::util::retry::RetryPolicy;
use crate::util::text::{preview, split_into_chunks};
use crate::util::timeout::with_timeout;

pub const GOOGLE_TRANSLATE_BASE_URL: &str = "https://translate.googleapis.com";
const MAX_CHUNK_CHARS: usize = 4500;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` to `target`. Implementations return the
    /// text unchanged when `source == target` or the text is blank.
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, FarmGuideError>;
}

/// Client for the public `translate_a/single` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    base_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslator {
    pub fn new() -> Self {
        Self {
            base_url: GOOGLE_TRANSLATE_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
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
        match config.get_base_url("translate") {
            Some(url) => Self::new().with_base_url(url),
            None => Self::new(),
        }
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        source: Language,
        target: Language,
    ) -> Result<String, FarmGuideError> {
        let url = format!("{}/translate_a/single", trim_trailing_slash(&self.base_url));
        with_timeout(self.timeout, async {
            let response = shared_client()
                .get(&url)
                .query(&[
                    ("client", "gtx"),
                    ("sl", source.code()),
                    ("tl", target.code()),
                    ("dt", "t"),
                    ("q", chunk),
                ])
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error(status, &body));
            }
            let body: serde_json::Value = response.json().await?;
            parse_translation(&body)
        })
        .await
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, FarmGuideError> {
        if source == target || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let translated = self
                .retry_policy
                .execute(|| self.translate_chunk(chunk, source, target))
                .await?;
            parts.push(translated);
        }
        let out = parts.join(" ");
        debug!(%source, %target, out = %preview(&out, 200), "translated");
        Ok(out)
    }
}

/// The endpoint answers `[[["<translated>","<source>",...], ...], ...]`;
/// the translation is the concatenation of each segment's first element.
fn parse_translation(body: &serde_json::Value) -> Result<String, FarmGuideError> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| FarmGuideError::provider("google-translate", "unexpected response shape"))?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
        .collect();
    if text.trim().is_empty() {
        return Err(FarmGuideError::provider("google-translate", "empty translation"));
    }
    Ok(text)
}
