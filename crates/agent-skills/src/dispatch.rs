// src/dispatch.rs
//! Tool invocation routing

use tracing::{debug, warn};

use crate::error::SkillError;
use crate::registry::SkillRegistry;
use crate::schema;
use crate::tool::ToolOutput;

impl SkillRegistry {
    /// Route one tool call to its executor.
    ///
    /// Only an unregistered tool name is a hard error. Invalid arguments,
    /// executor failures and timeouts all come back as `ToolOutput::Error`.
    pub async fn invoke(
        &self,
        tool: &str,
        args: serde_json::Value,
    ) -> Result<ToolOutput, SkillError> {
        let entry = self
            .state
            .read()
            .await
            .catalog
            .get(tool)
            .cloned()
            .ok_or_else(|| SkillError::ToolNotFound(tool.to_string()))?;

        let args = match schema::validate(&entry.definition.parameters, args) {
            Ok(args) => args,
            Err(reason) => {
                warn!(tool, skill = entry.skill, %reason, "Rejected tool arguments");
                return Ok(ToolOutput::error(format!(
                    "invalid arguments for '{}': {}",
                    tool, reason
                )));
            }
        };

        debug!(tool, skill = entry.skill, "Dispatching tool call");

        let call = tokio::time::timeout(self.invoke_timeout, entry.executor.execute(args));
        let output = match call.await {
            Ok(output) => output,
            Err(_) => {
                warn!(
                    tool,
                    timeout_secs = self.invoke_timeout.as_secs_f64(),
                    "Tool call timed out"
                );
                ToolOutput::error("timeout")
            }
        };

        if let ToolOutput::Error(reason) = &output {
            warn!(tool, skill = entry.skill, %reason, "Tool call failed");
        } else {
            debug!(tool, skill = entry.skill, "Tool call completed");
        }

        Ok(output)
    }
}
