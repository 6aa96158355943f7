//! Utility modules: retry, timeout, text chunking.

pub mod retry;
pub mod text;
pub mod timeout;
