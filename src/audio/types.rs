//! Audio-related types.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Encoded audio container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Webm,
    M4a,
    Flac,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
            Self::M4a => "m4a",
            Self::Flac => "flac",
        }
    }

    /// Format for a (normalized) MIME type.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "audio/mpeg" | "audio/mp3" | "audio/mpga" => Some(Self::Mp3),
            "audio/mp4" | "video/mp4" | "audio/x-m4a" | "audio/m4a" => Some(Self::M4a),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/webm" | "video/webm" => Some(Self::Webm),
            "audio/ogg" | "application/ogg" => Some(Self::Ogg),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            _ => None,
        }
    }
}

/// Result of audio transcription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: Option<String>,
    pub duration_seconds: Option<f64>,
}

/// Request for speech synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// Voice language.
    pub language: Language,
}
