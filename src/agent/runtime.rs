//! The agent runtime: one model, one search tool, per-session memory.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::session::{SessionRegistry, DEFAULT_MAX_TURNS};
use crate::config::{FarmGuideConfig, Settings};
use crate::error::FarmGuideError;
use crate::generation::{generate_text, LoopLimits};
use crate::models::GroqModel;
use crate::provider::{self, ModelProvider};
use crate::tools::{SearchTool, TavilySearchProvider, Tool, ToolExecutionContext};
use crate::types::{GenerationSettings, ModelMessage};

/// Answer returned when the tool loop fails.
pub const APOLOGY: &str = "Sorry, I encountered an issue while processing your query.";

/// Tunables for [`AgentRuntime`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: GroqModel,
    pub settings: GenerationSettings,
    pub limits: LoopLimits,
    pub session_idle: Duration,
    /// Turns remembered per session.
    pub session_max_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: GroqModel::default(),
            settings: GenerationSettings::advisory(),
            limits: LoopLimits::default(),
            session_idle: Duration::from_secs(3600),
            session_max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl AgentConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.groq_model(),
            limits: LoopLimits {
                max_tool_calls: settings.search_budget,
                ..LoopLimits::default()
            },
            session_idle: Duration::from_secs(settings.session_idle_secs),
            session_max_turns: settings.session_max_turns,
            ..Self::default()
        }
    }
}

/// Runs the tool-augmented agent for many sessions.
pub struct AgentRuntime {
    provider: Arc<dyn ModelProvider>,
    tools: Vec<Arc<dyn Tool>>,
    sessions: SessionRegistry,
    config: AgentConfig,
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl AgentRuntime {
    /// Build the Groq provider and the Tavily search tool from `config`.
    pub fn new(config: &FarmGuideConfig, agent: AgentConfig) -> Result<Self, FarmGuideError> {
        let provider = provider::create_provider(&agent.model, config)?;
        let search = TavilySearchProvider::from_config(config)?;
        let tool: Arc<dyn Tool> = Arc::new(SearchTool::new(Arc::new(search)));
        let runtime = Self::from_parts(provider, vec![tool], agent)?;
        info!(model = %runtime.provider.model_id(), "agent runtime ready");
        Ok(runtime)
    }

    /// Assemble a runtime from an existing provider and tool set.
    pub fn from_parts(
        provider: Arc<dyn ModelProvider>,
        tools: Vec<Arc<dyn Tool>>,
        config: AgentConfig,
    ) -> Result<Self, FarmGuideError> {
        if !tools.is_empty() && !provider.capabilities().supports_tools {
            return Err(FarmGuideError::Configuration(format!(
                "model {} does not support tool calling",
                provider.model_id()
            )));
        }
        Ok(Self {
            provider,
            tools,
            sessions: SessionRegistry::new(config.session_idle)
                .with_max_turns(config.session_max_turns),
            config,
        })
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the conversation and return the final answer, or [`APOLOGY`] if
    /// anything in the loop fails.
    pub async fn answer(&self, conversation: &[ModelMessage], session_key: &str) -> String {
        match self.try_answer(conversation, session_key).await {
            Ok(text) => text,
            Err(e) => {
                warn!(session = session_key, error = %e, "agent failed; returning apology");
                APOLOGY.to_string()
            }
        }
    }

    /// Like [`AgentRuntime::answer`] but surfaces the error. Memory is only
    /// updated when the loop succeeds.
    pub async fn try_answer(
        &self,
        conversation: &[ModelMessage],
        session_key: &str,
    ) -> Result<String, FarmGuideError> {
        let session = self.sessions.get_or_create(session_key);
        let mut memory = session.lock().await;

        let messages = memory.context_for(conversation);
        debug!(session = session_key, messages = messages.len(), "agent turn");

        let ctx = ToolExecutionContext {
            session_key: session_key.to_string(),
        };
        let result = generate_text(
            self.provider.as_ref(),
            messages,
            self.config.settings.clone(),
            &self.tools,
            &self.config.limits,
            &ctx,
        )
        .await?;

        debug!(
            session = session_key,
            steps = result.steps.len(),
            tool_calls = result.tool_calls_executed,
            tokens = result.usage.total_tokens,
            "agent turn complete"
        );
        memory.commit(result.messages);
        Ok(result.text)
    }
}
