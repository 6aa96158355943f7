//! Text generation with a tool loop.

pub mod text;

pub use text::{generate_text, LoopLimits, TOOL_BUDGET_EXHAUSTED};
