//! Groq model definitions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ModelCapabilities;

/// Groq-hosted chat models (OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum GroqModel {
    #[strum(serialize = "llama-3.3-70b-versatile")]
    Llama3370bVersatile,
    #[strum(serialize = "llama-3.1-8b-instant")]
    Llama318bInstant,
    #[strum(serialize = "openai/gpt-oss-120b")]
    GptOss120b,
    #[strum(default)]
    Custom(String),
}

impl Default for GroqModel {
    fn default() -> Self {
        Self::Llama3370bVersatile
    }
}

impl GroqModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Llama3370bVersatile => "llama-3.3-70b-versatile",
            Self::Llama318bInstant => "llama-3.1-8b-instant",
            Self::GptOss120b => "openai/gpt-oss-120b",
            Self::Custom(s) => s,
        }
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        match self {
            Self::Llama3370bVersatile => ModelCapabilities {
                max_output_tokens: Some(32_768),
                ..ModelCapabilities::tool_chat(131_072)
            },
            Self::Llama318bInstant => ModelCapabilities {
                max_output_tokens: Some(131_072),
                ..ModelCapabilities::tool_chat(131_072)
            },
            Self::GptOss120b => ModelCapabilities {
                max_output_tokens: Some(65_536),
                ..ModelCapabilities::tool_chat(131_072)
            },
            // Unknown ids are assumed tool-capable; the API rejects them otherwise.
            Self::Custom(_) => ModelCapabilities::tool_chat(32_768),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_custom_ids() {
        assert_eq!(
            "llama-3.3-70b-versatile".parse::<GroqModel>().unwrap(),
            GroqModel::Llama3370bVersatile
        );
        let custom: GroqModel = "qwen/qwen3-32b".parse().unwrap();
        assert_eq!(custom.as_str(), "qwen/qwen3-32b");
        assert!(custom.capabilities().supports_tools);
    }

    #[test]
    fn default_model_supports_tools() {
        let model = GroqModel::default();
        assert_eq!(model.to_string(), "llama-3.3-70b-versatile");
        assert!(model.capabilities().supports_tools);
    }
}
