//! Text-to-speech trait.

use async_trait::async_trait;

use super::types::{AudioFormat, SpeechRequest};
use crate::error::FarmGuideError;
use crate::language::Language;

/// Trait for text-to-speech providers.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Generate speech audio from text.
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<Vec<u8>, FarmGuideError>;

    /// Whether a voice exists for `language`.
    fn supports(&self, language: Language) -> bool {
        let _ = language;
        true
    }

    /// Container of the bytes returned by [`SpeechProvider::generate_speech`].
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }
}
