//! Model provider trait and the Groq-backed implementation.

pub mod groq;
pub mod http;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::models::{GroqModel, ModelCapabilities};
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by chat model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "groq").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Capabilities of the model.
    fn capabilities(&self) -> &ModelCapabilities;

    /// Generate one assistant turn (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, FarmGuideError>;
}

/// Create the chat provider for `model` from configured credentials.
pub fn create_provider(
    model: &GroqModel,
    config: &FarmGuideConfig,
) -> Result<Arc<dyn ModelProvider>, FarmGuideError> {
    let api_key = config
        .get_api_key("groq")
        .ok_or_else(|| FarmGuideError::Authentication("Missing GROQ_API_KEY".into()))?;
    let provider = match config.get_base_url("groq") {
        Some(base_url) => groq::GroqProvider::with_base_url(model.clone(), api_key, base_url),
        None => groq::GroqProvider::new(model.clone(), api_key),
    };
    Ok(Arc::new(provider))
}
