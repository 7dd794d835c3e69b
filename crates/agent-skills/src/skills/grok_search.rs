//! Grok live web search skill (xAI chat completions with search enabled)

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{SkillDescriptor, SkillModule};
use crate::context::SkillContext;
use crate::devlog::append_markdown;
use crate::error::{ApiError, SkillError};
use crate::http::{chat_completion, ChatMessage, ChatRequest};
use crate::tool::{parse_args, Executor, ExecutorMap, ToolDefinition, ToolOutput};

pub const DESCRIPTOR: SkillDescriptor = SkillDescriptor {
    name: "grok_search",
    tool_names: &["web_search"],
    summary: "Search the web and X in real time with Grok, optionally logging findings to docs/",
};

pub const CREDENTIAL: &str = "XAI_API_KEY";

/// Research log, relative to the work dir
pub const RESEARCH_LOG: &str = "docs/research-log.md";

const MODEL: &str = "grok-4-fast";

const SYSTEM_PROMPT: &str = "You are a research assistant for a crypto meme community. \
Answer concisely with concrete facts, dates and numbers. Cite sources inline as URLs.";

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>()\[\]"']+"#).expect("valid URL regex"));

pub fn resolve() -> Result<Box<dyn SkillModule>, SkillError> {
    Ok(Box::new(GrokSearchSkill))
}

pub struct GrokSearchSkill;

impl SkillModule for GrokSearchSkill {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "web_search",
            "Search the web, X posts and news in real time using Grok. Returns a sourced answer.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for",
                        "maxLength": 500
                    },
                    "source": {
                        "type": "string",
                        "enum": ["all", "web", "x", "news"],
                        "description": "Restrict the search to one source (default: all)"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of sources to consult (default: 5)",
                        "minimum": 1,
                        "maximum": 20
                    },
                    "save": {
                        "type": "boolean",
                        "description": "Append the answer to docs/research-log.md (default: false)"
                    }
                },
                "required": ["query"]
            }),
        )]
    }

    fn create_executors(&self, ctx: Arc<SkillContext>) -> Result<ExecutorMap, SkillError> {
        let client = ctx
            .http_client()
            .map_err(|e| SkillError::load(DESCRIPTOR.name, e.to_string()))?;

        let mut executors = ExecutorMap::new();
        executors.insert("web_search".to_string(), Arc::new(WebSearch { ctx, client }));
        Ok(executors)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Source {
    #[default]
    All,
    Web,
    X,
    News,
}

impl Source {
    fn search_sources(&self) -> serde_json::Value {
        match self {
            Source::All => serde_json::json!([{"type": "web"}, {"type": "x"}, {"type": "news"}]),
            Source::Web => serde_json::json!([{"type": "web"}]),
            Source::X => serde_json::json!([{"type": "x"}]),
            Source::News => serde_json::json!([{"type": "news"}]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebSearchArgs {
    query: String,
    #[serde(default)]
    source: Source,
    #[serde(default = "default_max_results")]
    max_results: u32,
    #[serde(default)]
    save: bool,
}

fn default_max_results() -> u32 {
    5
}

/// Citations first, then URLs found in the answer text, deduplicated
fn collect_sources(citations: &[String], answer: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    citations
        .iter()
        .map(|c| c.trim().to_string())
        .chain(
            URL_RE
                .find_iter(answer)
                .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':']).to_string()),
        )
        .filter(|url| !url.is_empty() && seen.insert(url.clone()))
        .collect()
}

fn format_answer(query: &str, answer: &str, sources: &[String]) -> String {
    let mut output = format!("## Web Search: {}\n\n{}\n", query, answer.trim());
    if !sources.is_empty() {
        output.push_str("\n### Sources\n");
        for (i, url) in sources.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, url));
        }
    }
    output
}

pub struct WebSearch {
    ctx: Arc<SkillContext>,
    client: Client,
}

impl WebSearch {
    async fn run(&self, args: serde_json::Value) -> Result<String, ApiError> {
        let api_key = self.ctx.credential(CREDENTIAL)?;
        let args: WebSearchArgs = parse_args("web_search", args)?;

        let query = args.query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidArguments("query must not be empty".to_string()));
        }

        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(query)],
            search_parameters: Some(serde_json::json!({
                "mode": "on",
                "sources": args.source.search_sources(),
                "return_citations": true,
                "max_search_results": args.max_results.clamp(1, 20),
            })),
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.ctx.endpoints().xai.trim_end_matches('/')
        );
        debug!(query, source = ?args.source, "Running Grok search");

        let response = chat_completion(&self.client, &url, &api_key, &request).await?;
        let answer = response
            .content()
            .ok_or_else(|| ApiError::EmptyResponse("Grok returned no answer".to_string()))?;

        let sources = collect_sources(&response.citations, answer);
        let mut output = format_answer(query, answer, &sources);

        if args.save {
            let path = self.ctx.work_dir().join(RESEARCH_LOG);
            let section = format!(
                "\n## {}: {}\n\n{}\n",
                Utc::now().format("%Y-%m-%d %H:%M UTC"),
                query,
                output.trim_start_matches(&format!("## Web Search: {}\n\n", query))
            );
            match append_markdown(&path, &section, Some("# Research Log\n")).await {
                Ok(()) => output.push_str(&format!("\nSaved to {}\n", RESEARCH_LOG)),
                Err(e) => {
                    warn!(error = %e, "Failed to append research log");
                    return Err(ApiError::Io(e));
                }
            }
        }

        Ok(output)
    }
}

#[async_trait]
impl Executor for WebSearch {
    async fn execute(&self, args: serde_json::Value) -> ToolOutput {
        self.run(args).await.into()
    }
}
