//! Agent: conversation building, session memory and the tool-using runtime.

pub mod conversation;
pub mod runtime;
pub mod session;

pub use conversation::{build_conversation, combine_inputs, SYSTEM_PROMPT};
pub use runtime::{AgentConfig, AgentRuntime, APOLOGY};
pub use session::{SessionHandle, SessionMemory, SessionRegistry, DEFAULT_MAX_TURNS};
