//! Audio transcription trait.

use async_trait::async_trait;

use super::types::TranscriptionResult;
use crate::error::FarmGuideError;

/// Trait for audio transcription providers.
#[async_trait]
pub trait AudioProvider: Send + Sync {
    /// Transcribe audio data. `language` is an ISO 639-1 hint.
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        language: Option<&str>,
    ) -> Result<TranscriptionResult, FarmGuideError>;
}
