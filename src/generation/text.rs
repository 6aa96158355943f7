//! Text generation with tool loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::FarmGuideError;
use crate::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::types::*;

/// Result text returned for tool calls refused by the budget.
pub const TOOL_BUDGET_EXHAUSTED: &str =
    "tool budget exhausted: answer from the information already gathered";

/// Bounds on a single tool loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    /// Model calls before the loop gives up.
    pub max_iterations: usize,
    /// Tool executions allowed across the whole loop.
    pub max_tool_calls: usize,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            max_tool_calls: 1,
        }
    }
}

/// Generate text with an optional tool loop.
///
/// Tool calls are executed and fed back until the model answers without
/// requesting tools. Calls beyond `limits.max_tool_calls` are not executed;
/// the model receives an error result instead.
pub async fn generate_text(
    provider: &dyn ModelProvider,
    mut messages: Vec<ModelMessage>,
    settings: GenerationSettings,
    tools: &[Arc<dyn Tool>],
    limits: &LoopLimits,
    ctx: &ToolExecutionContext,
) -> Result<GenerateTextResult, FarmGuideError> {
    let tool_defs: Option<Vec<ToolDefinition>> =
        if tools.is_empty() || !provider.capabilities().supports_tools {
            None
        } else {
            Some(tools.iter().map(|t| t.definition()).collect())
        };

    let mut steps = Vec::new();
    let mut total_usage = Usage::default();
    let mut executed = 0usize;

    for iteration in 0..limits.max_iterations {
        let request = ProviderRequest {
            messages: messages.clone(),
            settings: settings.clone(),
            tools: tool_defs.clone(),
        };

        debug!(iteration, session = %ctx.session_key, "generate_text: calling provider");
        let response = provider.generate_text(&request).await?;
        total_usage.merge(&response.usage);

        let mut step = GenerationStep {
            text: response.text.clone(),
            tool_calls: response.tool_calls.clone(),
            tool_results: Vec::new(),
            usage: response.usage,
            finish_reason: response.finish_reason,
        };

        if response.tool_calls.is_empty() {
            steps.push(step);
            messages.push(ModelMessage::assistant(response.text.clone()));
            return Ok(GenerateTextResult {
                text: response.text,
                steps,
                messages,
                usage: total_usage,
                finish_reason: response.finish_reason,
                tool_calls_executed: executed,
            });
        }

        messages.push(ModelMessage::assistant_tool_calls(
            &response.text,
            &response.tool_calls,
        ));

        for tc in &response.tool_calls {
            let result = if executed >= limits.max_tool_calls {
                warn!(tool = %tc.name, budget = limits.max_tool_calls, "tool call refused");
                error_result(tc, TOOL_BUDGET_EXHAUSTED.to_string())
            } else {
                executed += 1;
                run_tool(tools, tc, ctx).await
            };
            step.tool_results.push(result.clone());
            messages.push(ModelMessage::tool_result(result));
        }

        steps.push(step);
    }

    Err(FarmGuideError::InvalidState(format!(
        "tool loop did not finish within {} model calls",
        limits.max_iterations
    )))
}

async fn run_tool(
    tools: &[Arc<dyn Tool>],
    tc: &AgentToolCall,
    ctx: &ToolExecutionContext,
) -> AgentToolResult {
    let Some(tool) = tools.iter().find(|t| t.name() == tc.name) else {
        warn!(tool = %tc.name, "Tool not found");
        return error_result(tc, format!("Tool '{}' not found", tc.name));
    };

    let args = ToolArguments::new(tc.arguments.clone());
    match tool.execute(&args, ctx).await {
        Ok(result) => AgentToolResult {
            tool_call_id: tc.id.clone(),
            result,
            is_error: false,
        },
        Err(e) => {
            warn!(tool = %tc.name, error = %e, "Tool execution failed");
            error_result(tc, e.to_string())
        }
    }
}

fn error_result(tc: &AgentToolCall, message: String) -> AgentToolResult {
    AgentToolResult {
        tool_call_id: tc.id.clone(),
        result: serde_json::json!({ "error": message }),
        is_error: true,
    }
}
