//! # Agent Module
//!
//! The conversational agent: an Anthropic model driven by Rig, whose system
//! prompt carries only one-line skill summaries. Full tool schemas enter the
//! context only after the model calls `load_skill`.

use anyhow::Result;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::anthropic;
use std::sync::Arc;
use tracing::{debug, info};

use agent_skills::{SkillContext, SkillRegistry};

use crate::config::Config;
use crate::tools::{LoadSkillTool, UseToolTool};

// =============================================================================
// SYSTEM PROMPT
// =============================================================================
const SYSTEM_PROMPT: &str = r#"
You are the assistant of a crypto meme community. You create memes, research
tokens and accounts, build small UI components and post updates on X.

You work through skills. Each skill bundles tools that call an external API.
Tools are NOT available until their skill is loaded:

1. Pick the skill you need from the list below
2. Call load_skill with its name; you get back the tool schemas
3. Call use_tool with the tool name and arguments matching the schema

Tool results that start with "Error:" are failures. Read the reason, fix the
arguments or tell the user what is missing (for example an API key). Never
post to X unless the user asked you to.

AVAILABLE SKILLS:
"#;

/// Maximum tokens per model response
const MAX_TOKENS: u64 = 4096;

/// Build the preamble: fixed instructions plus one line per skill
pub fn build_preamble(registry: &SkillRegistry) -> String {
    format!("{}{}\n", SYSTEM_PROMPT.trim_start(), registry.table().summaries())
}

// =============================================================================
// SKILL AGENT
// =============================================================================
/// Agent wired to the skill registry.
pub struct SkillAgent {
    config: Config,
    registry: Arc<SkillRegistry>,
    ctx: Arc<SkillContext>,
}

impl SkillAgent {
    pub fn new(config: Config, registry: Arc<SkillRegistry>, ctx: Arc<SkillContext>) -> Self {
        Self {
            config,
            registry,
            ctx,
        }
    }

    /// Answer one prompt, loading and calling skills as the model decides.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        info!(model = %self.config.model, "Starting agent turn");

        // Reads ANTHROPIC_API_KEY
        let client = anthropic::Client::from_env();

        let preamble = build_preamble(&self.registry);
        debug!(chars = preamble.len(), "Preamble built");

        let agent = client
            .agent(&self.config.model)
            .preamble(&preamble)
            .max_tokens(MAX_TOKENS)
            .tool(LoadSkillTool::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.ctx),
            ))
            .tool(UseToolTool::new(Arc::clone(&self.registry)))
            .build();

        let response = agent
            .prompt(prompt)
            .multi_turn(self.config.max_turns)
            .await
            .map_err(|e| anyhow::anyhow!("Agent execution failed: {}", e))?;

        let loaded = self.registry.loaded_skills().await;
        info!(skills = ?loaded, "Agent turn completed");

        Ok(response)
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_lists_every_skill() {
        let registry = SkillRegistry::builtin();
        let preamble = build_preamble(&registry);

        assert!(preamble.contains("load_skill"));
        for descriptor in registry.list_skills() {
            assert!(preamble.contains(&descriptor.summary_line()));
        }
    }

    #[test]
    fn test_preamble_has_no_schemas() {
        let preamble = build_preamble(&SkillRegistry::builtin());
        assert!(!preamble.contains("\"properties\""));
    }

    #[test]
    fn test_agent_creation() {
        let agent = SkillAgent::new(
            Config::default(),
            Arc::new(SkillRegistry::builtin()),
            Arc::new(SkillContext::new(".")),
        );
        assert_eq!(agent.config.model, "claude-sonnet-4-5");
    }
}
