//! Convenience re-exports for common use.

pub use crate::agent::{AgentConfig, AgentRuntime};
pub use crate::audio::{AudioProvider, SpeechProvider, SpeechSynthesizer};
pub use crate::config::{FarmGuideConfig, Settings};
pub use crate::error::{FarmGuideError, Result};
pub use crate::language::Language;
pub use crate::models::GroqModel;
pub use crate::pipeline::{PipelineCoordinator, PipelineResult, RuntimeFactory};
pub use crate::provider::ModelProvider;
pub use crate::tools::{SearchProvider, Tool};
pub use crate::translate::Translator;
pub use crate::types::{GenerationSettings, ModelMessage, Role};
