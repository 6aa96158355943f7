//! Typed access to tool call arguments.

use crate::error::FarmGuideError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    /// Wrap a decoded argument value. Models occasionally send the arguments
    /// object as a JSON-encoded string; that form is decoded here.
    pub fn new(value: serde_json::Value) -> Self {
        let value = match value {
            serde_json::Value::String(raw) => match serde_json::from_str(raw.trim()) {
                Ok(obj @ serde_json::Value::Object(_)) => obj,
                _ => serde_json::Value::String(raw),
            },
            other => other,
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, FarmGuideError> {
        self.get_str_opt(key)
            .ok_or_else(|| FarmGuideError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }
}
