//! Generation settings and tool-loop results.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::message::{AgentToolCall, AgentToolResult, ModelMessage};
use super::usage::Usage;

/// Settings controlling text generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub seed: Option<u64>,
    pub user: Option<String>,
}

impl GenerationSettings {
    /// Low-randomness settings with a bounded answer length.
    pub fn advisory() -> Self {
        Self::builder().temperature(0.3).max_tokens(1500).build()
    }
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

/// One model call in a tool loop and the tools it triggered.
#[derive(Debug, Clone)]
pub struct GenerationStep {
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub tool_results: Vec<AgentToolResult>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

/// Result of a completed tool loop.
#[derive(Debug, Clone)]
pub struct GenerateTextResult {
    /// Final assistant text.
    pub text: String,
    pub steps: Vec<GenerationStep>,
    /// Input messages followed by every message the loop produced,
    /// ending with the final assistant message.
    pub messages: Vec<ModelMessage>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
    /// Tool calls actually executed (calls refused by the budget excluded).
    pub tool_calls_executed: usize,
}
