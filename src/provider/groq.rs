//! Groq provider (OpenAI-compatible).

use async_trait::async_trait;

use crate::error::FarmGuideError;
use crate::models::{GroqModel, ModelCapabilities};

use super::openai::OpenAiCompatibleProvider;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    inner: OpenAiCompatibleProvider,
}

impl GroqProvider {
    pub fn new(model: GroqModel, api_key: String) -> Self {
        Self::with_base_url(model, api_key, GROQ_BASE_URL.to_string())
    }

    pub fn with_base_url(model: GroqModel, api_key: String, base_url: String) -> Self {
        let capabilities = model.capabilities();
        Self {
            inner: OpenAiCompatibleProvider::new(
                "groq",
                model.as_str().to_string(),
                api_key,
                base_url,
                capabilities,
            ),
        }
    }
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
    fn capabilities(&self) -> &ModelCapabilities {
        self.inner.capabilities()
    }
    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, FarmGuideError> {
        self.inner.generate_text(request).await
    }
}
