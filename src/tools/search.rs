//! Web search for the agent, backed by Tavily.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::config::FarmGuideConfig;
use crate::error::FarmGuideError;
use crate::provider::http::{bearer_headers, shared_client, status_to_error, trim_trailing_slash};
use crate::util::retry::RetryPolicy;
use crate::util::text::preview;
use crate::util::timeout::with_timeout;

pub const SEARCH_TOOL_NAME: &str = "web_search_tool";
pub const SEARCH_TOOL_DESCRIPTION: &str =
    "Searches for agricultural information using Tavily Search API.";
pub const NO_RESULTS: &str = "No relevant results found.";
pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const MAX_RESULTS: u32 = 3;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// What a search backend returned.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<SearchHit>),
    /// The backend answered with plain text instead of a result list.
    Text(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<SearchOutcome, FarmGuideError>;
}

/// Tavily `/search` client.
pub struct TavilySearchProvider {
    api_key: String,
    base_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl TavilySearchProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: TAVILY_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Build from `tavily` credentials in `config`.
    pub fn from_config(config: &FarmGuideConfig) -> Result<Self, FarmGuideError> {
        let api_key = config
            .get_api_key("tavily")
            .ok_or_else(|| FarmGuideError::Authentication("Missing TAVILY_API_KEY".into()))?;
        let mut provider = Self::new(api_key);
        if let Some(url) = config.get_base_url("tavily") {
            provider = provider.with_base_url(url);
        }
        Ok(provider)
    }

    async fn search_once(&self, body: &serde_json::Value) -> Result<SearchOutcome, FarmGuideError> {
        let url = format!("{}/search", trim_trailing_slash(&self.base_url));
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &text));
        }

        let data: serde_json::Value = resp.json().await?;
        parse_tavily_response(data)
    }
}

#[async_trait]
impl SearchProvider for TavilySearchProvider {
    async fn search(&self, query: &str, max_results: u32) -> Result<SearchOutcome, FarmGuideError> {
        let body = serde_json::json!({
            "query": query,
            "search_depth": "basic",
            "max_results": max_results,
            "include_raw_content": false,
            "include_images": false,
            "include_answer": false,
        });
        debug!(query = %preview(query, 80), "tavily search");
        with_timeout(
            self.timeout,
            self.retry_policy.execute(|| self.search_once(&body)),
        )
        .await
    }
}

fn parse_tavily_response(data: serde_json::Value) -> Result<SearchOutcome, FarmGuideError> {
    match data {
        serde_json::Value::String(text) => Ok(SearchOutcome::Text(text)),
        serde_json::Value::Object(mut obj) => {
            let results = obj.remove("results").unwrap_or(serde_json::Value::Array(Vec::new()));
            let hits: Vec<SearchHit> = serde_json::from_value(results)?;
            Ok(SearchOutcome::Results(hits))
        }
        other => Err(FarmGuideError::provider(
            "tavily",
            format!("unexpected search response: {other}"),
        )),
    }
}

/// Render hits as the text block the model reads.
pub fn format_search_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(|hit| {
            format!(
                "URL: {}\nTitle: {}\nContent: {}\n---\n",
                hit.url, hit.title, hit.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The `web_search_tool` exposed to the agent.
///
/// Never fails: provider errors are turned into a `[Search Error]: ...`
/// string so the model can still answer.
pub struct SearchTool {
    provider: Arc<dyn SearchProvider>,
    parameters: AgentToolParameters,
}

impl SearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            parameters: AgentToolParameters::object()
                .string("query", "Search query about crops, chemicals or fertilizers", true)
                .build(),
        }
    }

    pub async fn search(&self, query: &str) -> String {
        match self.provider.search(query, MAX_RESULTS).await {
            Ok(SearchOutcome::Results(hits)) => {
                debug!(hits = hits.len(), "search completed");
                format_search_results(&hits)
            }
            Ok(SearchOutcome::Text(text)) => text,
            Err(e) => {
                warn!(error = %e, "search failed");
                format!("[Search Error]: {e}")
            }
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        SEARCH_TOOL_DESCRIPTION
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, FarmGuideError> {
        let query = match args.raw() {
            serde_json::Value::String(q) => q.as_str(),
            _ => args.get_str("query")?,
        };
        Ok(serde_json::Value::String(self.search(query).await))
    }
}
