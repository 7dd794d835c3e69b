//! # Meme Agent
//!
//! A command-line host for the community agent. Skills (image generation,
//! live search, UI generation, account/token analysis, posting to X) are
//! loaded on demand through the `agent-skills` registry.
//!
//! ## Quick Start
//! ```bash
//! cargo run -- skills
//! cargo run -- invoke web_search --args '{"query": "BONK news"}'
//! cargo run -- ask "Make a meme about frogs going to the moon"
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Configuration management
mod config;

/// Rig agent driving the conversation
mod agent;

/// Rig tools bridging the agent to the skill registry
mod tools;

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use agent_skills::{MarkdownJournal, SkillContext, SkillRegistry};

use crate::agent::SkillAgent;
use crate::config::Config;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
/// # Rust Concept: Subcommands with Clap
///
/// An enum deriving `Subcommand` becomes one CLI verb per variant; its
/// fields become that verb's arguments.
#[derive(Parser, Debug)]
#[command(
    name = "meme-agent",
    version = "0.1.0",
    about = "A community agent that loads API-backed skills on demand",
    long_about = r#"
Meme Agent - skills for a crypto meme community.

API keys are read from the environment (or .env) when a tool runs:
  GEMINI_API_KEY, XAI_API_KEY, V0_API_KEY, TWITTER_ACCESS_TOKEN, ANTHROPIC_API_KEY

EXAMPLES:
  # List the skills and their tools
  meme-agent skills

  # Show the tool schemas of one skill
  meme-agent load grok_search

  # Call a tool directly
  meme-agent invoke analyze_token --args '{"symbol": "$WIF", "chain": "solana"}'

  # Let the model decide
  meme-agent ask "Research PEPE sentiment and draft a tweet"
"#
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// The Anthropic model to use (overrides ANTHROPIC_MODEL env var)
    #[arg(short = 'm', long = "model", global = true, help = "Anthropic model to use")]
    model: Option<String>,

    /// Verbose output (debug logging)
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        help = "Enable verbose/debug logging",
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// List every skill with its tools
    Skills,

    /// Load a skill and print its tool definitions as JSON
    Load {
        /// Skill name, e.g. 'gemini_image'
        skill: String,
    },

    /// Invoke a tool directly, loading its skill first
    Invoke {
        /// Tool name, e.g. 'web_search'
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long = "args", default_value = "{}")]
        args: String,
    },

    /// Ask the agent; it loads skills as it needs them
    Ask {
        /// The request for the agent
        prompt: String,
    },
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    // Load configuration from environment/.env file
    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        info!(model = %model, "Using model from command line");
        config.model = model;
    }
    config.validate()?;

    info!(
        work_dir = %config.work_dir.display(),
        model = %config.model,
        "Configuration loaded"
    );

    let registry =
        Arc::new(SkillRegistry::builtin().with_invoke_timeout(config.invoke_timeout()));
    let ctx = Arc::new(
        SkillContext::new(config.work_dir.clone())
            .with_writer(Arc::new(MarkdownJournal::new(config.work_dir.clone())))
            .with_endpoints(config.endpoints.clone())
            .with_http_timeout(config.http_timeout()),
    );

    let result = run(args.command, config, registry, ctx).await;

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

/// Execute one subcommand and print its result to stdout
async fn run(
    command: Command,
    config: Config,
    registry: Arc<SkillRegistry>,
    ctx: Arc<SkillContext>,
) -> Result<()> {
    match command {
        Command::Skills => {
            println!("{}", registry.table().summaries());
        }

        Command::Load { skill } => {
            let loaded = registry.load_skill(&skill, &ctx).await?;
            println!("{}", serde_json::to_string_pretty(loaded.tools())?);
        }

        Command::Invoke { tool, args } => {
            let arguments = parse_tool_args(&args)?;
            registry.load_tool_owner(&tool, &ctx).await?;
            // Soft errors are printed, not turned into a failing exit status
            let output = registry.invoke(&tool, arguments).await?;
            println!("{}", output);
        }

        Command::Ask { prompt } => {
            let agent = SkillAgent::new(config, registry, ctx);
            let response = agent.ask(&prompt).await?;

            println!("\n{}", "=".repeat(60));
            println!("{}", response);
            println!("{}", "=".repeat(60));
        }
    }

    Ok(())
}

fn parse_tool_args(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).with_context(|| format!("--args is not valid JSON: {}", raw))
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Initialize the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays clean for tool output and JSON.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use agent_skills::{Endpoints, StaticCredentials};

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["test", "skills"]);
        assert_eq!(args.command, Command::Skills);
        assert!(!args.verbose);
        assert_eq!(args.model, None);
    }

    #[test]
    fn test_invoke_args() {
        let args = Args::parse_from([
            "test",
            "--verbose",
            "invoke",
            "web_search",
            "--args",
            r#"{"query": "pepe"}"#,
        ]);

        assert!(args.verbose);
        assert_eq!(
            args.command,
            Command::Invoke {
                tool: "web_search".to_string(),
                args: r#"{"query": "pepe"}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_global_model_flag_after_subcommand() {
        let args = Args::parse_from(["test", "ask", "gm", "--model", "claude-opus-4-1"]);
        assert_eq!(args.model.as_deref(), Some("claude-opus-4-1"));
        assert_eq!(
            args.command,
            Command::Ask {
                prompt: "gm".to_string()
            }
        );
    }

    #[test]
    fn test_invoke_default_args() {
        let args = Args::parse_from(["test", "invoke", "post_tweet"]);
        match args.command {
            Command::Invoke { args, .. } => assert_eq!(args, "{}"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_tool_args() {
        assert!(parse_tool_args(r#"{"text": "gm"}"#).is_ok());
        let err = parse_tool_args("{not json").unwrap_err();
        assert!(err.to_string().contains("--args is not valid JSON"));
    }

    #[tokio::test]
    async fn test_run_invoke_soft_error_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SkillRegistry::builtin());
        let ctx = Arc::new(
            SkillContext::new(dir.path())
                .with_credentials(Arc::new(StaticCredentials::new()))
                .with_endpoints(Endpoints::uniform("http://127.0.0.1:9")),
        );

        let command = Command::Invoke {
            tool: "post_tweet".to_string(),
            args: r#"{"text": "gm"}"#.to_string(),
        };
        run(command, Config::default(), Arc::clone(&registry), ctx)
            .await
            .unwrap();
        assert!(registry.is_loaded("twitter").await);
    }

    #[tokio::test]
    async fn test_run_load_unknown_skill_fails() {
        let registry = Arc::new(SkillRegistry::builtin());
        let ctx = Arc::new(SkillContext::new("."));
        let command = Command::Load {
            skill: "nonexistent".to_string(),
        };
        let err = run(command, Config::default(), registry, ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown skill: nonexistent");
    }
}
