// src/tool.rs
//! Tool definitions, executors and their outputs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ApiError;

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed under `required` in the input schema
    pub fn required(&self) -> Vec<&str> {
        self.parameters["required"]
            .as_array()
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Result of a tool invocation.
///
/// Executor failures are values: a failed call still yields an output, so a
/// single bad tool call never aborts the agent's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Text(String),
    Error(String),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Text(text.into())
    }

    pub fn error(reason: impl Into<String>) -> Self {
        ToolOutput::Error(reason.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutput::Error(_))
    }

    /// Rendered text, `Error: `-prefixed for failures
    pub fn into_string(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Error(reason) => format!("Error: {}", reason),
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutput::Text(text) => f.write_str(text),
            ToolOutput::Error(reason) => write!(f, "Error: {}", reason),
        }
    }
}

impl From<Result<String, ApiError>> for ToolOutput {
    fn from(result: Result<String, ApiError>) -> Self {
        match result {
            Ok(text) => ToolOutput::Text(text),
            Err(e) => ToolOutput::Error(e.to_string()),
        }
    }
}

/// The function that performs a tool's work
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, args: serde_json::Value) -> ToolOutput;
}

pub type DynExecutor = Arc<dyn Executor>;

/// Tool name to executor, built once per skill load
pub type ExecutorMap = HashMap<String, DynExecutor>;

/// Deserialize typed arguments, mapping failures to a soft error
pub fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    args: serde_json::Value,
) -> Result<T, ApiError> {
    serde_json::from_value(args)
        .map_err(|e| ApiError::InvalidArguments(format!("invalid arguments for '{}': {}", tool, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_rendering() {
        assert_eq!(ToolOutput::text("done").into_string(), "done");
        assert_eq!(ToolOutput::error("boom").into_string(), "Error: boom");
        assert_eq!(ToolOutput::error("boom").to_string(), "Error: boom");
        assert!(ToolOutput::error("x").is_error());
        assert!(!ToolOutput::text("x").is_error());
    }

    #[test]
    fn test_output_from_result() {
        let ok: ToolOutput = Ok::<_, ApiError>("fine".to_string()).into();
        assert_eq!(ok, ToolOutput::Text("fine".to_string()));

        let err: ToolOutput = Err::<String, _>(ApiError::Timeout).into();
        assert_eq!(err.into_string(), "Error: timeout");
    }

    #[test]
    fn test_definition_required() {
        let def = ToolDefinition::new(
            "demo",
            "Demo tool",
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
                "required": ["a"]
            }),
        );
        assert_eq!(def.required(), vec!["a"]);
    }

    #[derive(Debug, serde::Deserialize)]
    struct DemoArgs {
        #[allow(dead_code)]
        a: String,
    }

    #[test]
    fn test_parse_args_error_names_tool() {
        let err = parse_args::<DemoArgs>("demo", json!({})).unwrap_err();
        assert!(err.to_string().contains("'demo'"));
    }
}
