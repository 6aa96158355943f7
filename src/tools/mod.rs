//! Tool system for function calling.

pub mod arguments;
pub mod search;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use search::{
    SearchHit, SearchOutcome, SearchProvider, SearchTool, TavilySearchProvider, SEARCH_TOOL_NAME,
};
pub use tool::{Tool, ToolExecutionContext};
pub use types::AgentToolParameters;
