//! Audio: speech recognition in, speech synthesis out.

pub mod google_tts;
mod helpers;
pub mod synthesizer;
pub mod transcription;
pub mod tts;
pub mod types;
pub mod whisper;

pub use google_tts::GoogleTtsProvider;
pub use synthesizer::SpeechSynthesizer;
pub use transcription::AudioProvider;
pub use tts::SpeechProvider;
pub use types::*;
pub use whisper::WhisperTranscriptionProvider;
