//! # Tools Module
//!
//! The agent never sees the skill tools directly. It gets two rig tools:
//!
//! - `load_skill`: loads a skill and returns its tool schemas
//! - `use_tool`: routes a call to any loaded tool through the registry
//!
//! Both keep the agent's turn alive on failure: registry errors come back as
//! `"Error: ..."` text the model can read and recover from.

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use agent_skills::{SkillContext, SkillError, SkillRegistry};

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
/// Failures that cannot be reported back to the model as text.
///
/// Note: For Rig's Tool trait, our error must implement std::error::Error,
/// which thiserror provides via the derive macro.
#[derive(Error, Debug)]
pub enum SkillToolError {
    #[error("Failed to serialize tool definitions: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Render a registry error the way executor failures are rendered
fn soft_error(e: &SkillError) -> String {
    format!("Error: {}", e)
}

// =============================================================================
// LOAD SKILL TOOL
// =============================================================================
/// Loads a skill on demand and reports its tool schemas.
#[derive(Clone)]
pub struct LoadSkillTool {
    registry: Arc<SkillRegistry>,
    ctx: Arc<SkillContext>,
}

impl LoadSkillTool {
    pub fn new(registry: Arc<SkillRegistry>, ctx: Arc<SkillContext>) -> Self {
        Self { registry, ctx }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoadSkillArgs {
    /// Name of the skill to load
    pub skill: String,
}

impl Tool for LoadSkillTool {
    const NAME: &'static str = "load_skill";

    type Args = LoadSkillArgs;
    type Output = String;
    type Error = SkillToolError;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        let names: Vec<&str> = self.registry.list_skills().iter().map(|d| d.name).collect();
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Load a skill before using its tools. Returns the JSON schemas of \
                          the skill's tools; call them with use_tool."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "skill": {
                        "type": "string",
                        "enum": names,
                        "description": "Skill to load"
                    }
                },
                "required": ["skill"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let loaded = match self.registry.load_skill(&args.skill, &self.ctx).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(skill = %args.skill, error = %e, "Agent skill load failed");
                return Ok(soft_error(&e));
            }
        };

        info!(skill = loaded.name(), "Agent loaded skill");
        let schemas = serde_json::to_string_pretty(loaded.tools())?;
        Ok(format!(
            "Skill '{}' loaded. Tools:\n{}",
            loaded.name(),
            schemas
        ))
    }
}

// =============================================================================
// USE TOOL TOOL
// =============================================================================
/// Invokes a tool from a loaded skill.
#[derive(Clone)]
pub struct UseToolTool {
    registry: Arc<SkillRegistry>,
}

impl UseToolTool {
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UseToolArgs {
    /// Tool name, as returned by load_skill
    pub tool: String,

    /// Arguments matching the tool's schema
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl Tool for UseToolTool {
    const NAME: &'static str = "use_tool";

    type Args = UseToolArgs;
    type Output = String;
    type Error = SkillToolError;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Call a tool from a loaded skill. Load the skill with load_skill first."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "tool": {
                        "type": "string",
                        "description": "Tool name, e.g. 'generate_image'"
                    },
                    "arguments": {
                        "type": "object",
                        "description": "Arguments for the tool, matching its schema"
                    }
                },
                "required": ["tool"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        match self.registry.invoke(&args.tool, args.arguments).await {
            Ok(output) => Ok(output.into_string()),
            Err(SkillError::ToolNotFound(tool)) => Ok(format!(
                "Error: Tool not found: {}. Load the skill that provides it with load_skill.",
                tool
            )),
            Err(e) => Ok(soft_error(&e)),
        }
    }
}
