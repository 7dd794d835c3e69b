//! agent-skills: on-demand skill loading and tool dispatch for LLM agents
//!
//! A skill bundles one or more tools that wrap a third-party API. The agent
//! only sees cheap descriptors until it asks for a skill, at which point the
//! registry resolves the module, builds its executors and publishes the tools.
//!
//! - [`SkillTable`]: static descriptors and lazy module resolvers
//! - [`SkillRegistry`]: loaded skills, tool catalog, `load_skill` and `invoke`
//! - [`SkillContext`]: work dir, devlog writer, credentials and endpoints
//! - [`ToolOutput`]: every executor failure becomes a `"Error: ..."` string
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_skills::{SkillContext, SkillRegistry};
//!
//! let registry = SkillRegistry::builtin();
//! let ctx = Arc::new(SkillContext::new("."));
//!
//! registry.load_skill("grok_search", &ctx).await?;
//! let output = registry
//!     .invoke("web_search", serde_json::json!({"query": "BONK news"}))
//!     .await?;
//! println!("{}", output);
//! ```

pub mod context;
pub mod devlog;
pub mod error;
pub mod http;
pub mod registry;
pub mod schema;
pub mod skills;
pub mod tool;

mod dispatch;
mod loader;

// Re-exports for convenience
pub use context::{CredentialSource, Endpoints, EnvCredentials, SkillContext, StaticCredentials};
pub use devlog::{DevlogEntry, DevlogWriter, MarkdownJournal};
pub use error::{ApiError, SkillError};
pub use registry::{LoadedSkill, SkillRegistry, DEFAULT_INVOKE_TIMEOUT_SECS};
pub use skills::{builtin_table, SkillDescriptor, SkillEntry, SkillModule, SkillTable};
pub use tool::{DynExecutor, Executor, ExecutorMap, ToolDefinition, ToolOutput};
