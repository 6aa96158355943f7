//! Turns answer text into an MP3 file on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::tts::SpeechProvider;
use super::types::SpeechRequest;
use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::language::Language;

/// Writes synthesized speech under `<output_dir>`.
pub struct SpeechSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    output_dir: PathBuf,
    prefix: String,
}

impl SpeechSynthesizer {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(provider: Arc<dyn SpeechProvider>, config: &FarmGuideConfig) -> Self {
        Self::new(
            provider,
            config.voice_output_dir(),
            config.settings().tts_prefix.clone(),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Synthesize `text`, returning the file path, or `None` when the text
    /// is blank or synthesis fails.
    pub async fn synthesize(&self, text: &str, language: Language) -> Option<PathBuf> {
        if text.trim().is_empty() {
            debug!("empty text; skipping speech");
            return None;
        }
        match self.try_synthesize(text, language).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(language = %language, error = %e, "speech synthesis failed");
                None
            }
        }
    }

    pub async fn try_synthesize(&self, text: &str, language: Language) -> Result<PathBuf, FarmGuideError> {
        let voice = language.speech_fallback();
        if voice != language {
            debug!(requested = %language, voice = %voice, "using fallback voice");
        }
        if !self.provider.supports(voice) {
            return Err(FarmGuideError::UnsupportedLanguage(format!(
                "no speech voice for '{language}'"
            )));
        }

        let text = language.normalize_punctuation(text);
        if text.is_empty() {
            return Err(FarmGuideError::InvalidArgument(
                "Speech text cannot be empty".to_string(),
            ));
        }

        let audio = self
            .provider
            .generate_speech(&SpeechRequest {
                text,
                language: voice,
            })
            .await?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(self.file_name(voice));
        tokio::fs::write(&path, &audio).await?;
        info!(path = %path.display(), bytes = audio.len(), voice = %voice, "speech saved");
        Ok(path)
    }

    fn file_name(&self, voice: Language) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}_{}.{}",
            self.prefix,
            voice.code(),
            chrono::Utc::now().timestamp(),
            &id[..8],
            self.provider.format().extension()
        )
    }
}
