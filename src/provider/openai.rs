//! OpenAI-compatible Chat Completions provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::FarmGuideError;
use crate::models::ModelCapabilities;
use crate::types::*;
use crate::util::retry::RetryPolicy;

use super::http::{bearer_headers, shared_client, status_to_error, trim_trailing_slash};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

/// Provider for any endpoint speaking `/chat/completions`.
pub struct OpenAiCompatibleProvider {
    provider_name: String,
    model_id: String,
    api_key: String,
    base_url: String,
    capabilities: ModelCapabilities,
    retry_policy: RetryPolicy,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        provider_name: impl Into<String>,
        model_id: String,
        api_key: String,
        base_url: String,
        capabilities: ModelCapabilities,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            model_id,
            api_key,
            base_url,
            capabilities,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": messages,
            "stream": false,
        });

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            body["max_tokens"] = max.into();
        }
        if let Some(temp) = settings.temperature {
            body["temperature"] = temp.into();
        }
        if let Some(top_p) = settings.top_p {
            body["top_p"] = top_p.into();
        }
        if let Some(seed) = settings.seed {
            body["seed"] = seed.into();
        }
        if let Some(ref user) = settings.user {
            body["user"] = user.clone().into();
        }

        if let Some(tools) = request.tools.as_ref().filter(|t| !t.is_empty()) {
            let tool_defs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = tool_defs.into();
            body["tool_choice"] = "auto".into();
        }

        body
    }

    async fn generate_once(&self, body: &serde_json::Value) -> Result<ProviderResponse, FarmGuideError> {
        let url = format!("{}/chat/completions", trim_trailing_slash(&self.base_url));

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| FarmGuideError::api(200, "No choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            tool_calls,
            finish_reason: choice.finish_reason.as_deref().and_then(|r| r.parse().ok()),
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, FarmGuideError> {
        let body = self.build_request_body(request);
        debug!(
            provider = %self.provider_name,
            model = %self.model_id,
            messages = request.messages.len(),
            "chat completion"
        );
        self.retry_policy.execute(|| self.generate_once(&body)).await
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    if let Some(tr) = msg.tool_result_part() {
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": tr.tool_call_id,
            "content": tr.content_text(),
        });
    }

    let text = msg.text();
    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        return serde_json::json!({
            "role": msg.role.to_string(),
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": msg.role.to_string(), "content": text })
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatFunction,
}

#[derive(Deserialize)]
struct ChatFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
