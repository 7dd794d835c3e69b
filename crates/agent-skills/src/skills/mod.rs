//! Skill descriptor table and the built-in skills
//!
//! Skills follow a progressive-disclosure pattern:
//!
//! 1. At session start only descriptors (name, tool names, one-line summary)
//!    are shown to the model. They are `'static` and cost nothing to list.
//! 2. When the model needs a skill, the loader resolves its module, reads the
//!    full tool definitions and runs `create_executors` with the context.
//!
//! Adding a skill means writing one module that exposes a `DESCRIPTOR` and a
//! `resolve` function, then adding one line to [`builtin_table`].
//!
//! ```rust,ignore
//! use agent_skills::skills::builtin_table;
//!
//! for descriptor in builtin_table().list_skills() {
//!     println!("{}: {}", descriptor.name, descriptor.summary);
//! }
//! ```

pub mod gemini_image;
pub mod grok_search;
pub mod twitter;
pub mod v0_ui;
pub mod xai_analysis;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::SkillContext;
use crate::error::SkillError;
use crate::tool::{ExecutorMap, ToolDefinition};

/// Static, cheap-to-advertise metadata for a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillDescriptor {
    pub name: &'static str,
    pub tool_names: &'static [&'static str],
    pub summary: &'static str,
}

impl SkillDescriptor {
    /// One prompt line: `- **name**: summary (tools: a, b)`
    pub fn summary_line(&self) -> String {
        format!(
            "- **{}**: {} (tools: {})",
            self.name,
            self.summary,
            self.tool_names.join(", ")
        )
    }

    pub fn provides(&self, tool: &str) -> bool {
        self.tool_names.contains(&tool)
    }
}

/// A skill's full implementation, resolved on first load
pub trait SkillModule: Send + Sync {
    /// Full tool definitions, one per advertised tool name
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Build the executors, closing over the shared context
    fn create_executors(&self, ctx: Arc<SkillContext>) -> Result<ExecutorMap, SkillError>;
}

/// Resolves a skill name to its module. Not invoked until first load.
pub type ModuleResolver = Arc<dyn Fn() -> Result<Box<dyn SkillModule>, SkillError> + Send + Sync>;

/// Descriptor plus the resolver for its module
#[derive(Clone)]
pub struct SkillEntry {
    pub descriptor: SkillDescriptor,
    resolver: ModuleResolver,
}

impl SkillEntry {
    pub fn new<F>(descriptor: SkillDescriptor, resolver: F) -> Self
    where
        F: Fn() -> Result<Box<dyn SkillModule>, SkillError> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            resolver: Arc::new(resolver),
        }
    }

    pub fn resolve(&self) -> Result<Box<dyn SkillModule>, SkillError> {
        (self.resolver)()
    }
}

impl fmt::Debug for SkillEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered table of every known skill, loaded or not
#[derive(Debug, Clone, Default)]
pub struct SkillTable {
    entries: Vec<SkillEntry>,
    index: HashMap<&'static str, usize>,
}

impl SkillTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill; names must be unique
    pub fn register(&mut self, entry: SkillEntry) -> Result<(), SkillError> {
        let name = entry.descriptor.name;
        if self.index.contains_key(name) {
            return Err(SkillError::DuplicateSkill(name.to_string()));
        }
        self.index.insert(name, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, entry: SkillEntry) -> Result<Self, SkillError> {
        self.register(entry)?;
        Ok(self)
    }

    /// All descriptors in registration order
    pub fn list_skills(&self) -> Vec<SkillDescriptor> {
        self.entries.iter().map(|e| e.descriptor).collect()
    }

    pub fn get(&self, name: &str) -> Option<&SkillEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// The skill advertising `tool`, if any
    pub fn owner_of_tool(&self, tool: &str) -> Option<&SkillDescriptor> {
        self.entries
            .iter()
            .map(|e| &e.descriptor)
            .find(|d| d.provides(tool))
    }

    /// Prompt-ready listing of every skill
    pub fn summaries(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.descriptor.summary_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Table with every built-in skill
pub fn builtin_table() -> SkillTable {
    let entries = [
        SkillEntry::new(gemini_image::DESCRIPTOR, gemini_image::resolve),
        SkillEntry::new(grok_search::DESCRIPTOR, grok_search::resolve),
        SkillEntry::new(v0_ui::DESCRIPTOR, v0_ui::resolve),
        SkillEntry::new(xai_analysis::DESCRIPTOR, xai_analysis::resolve),
        SkillEntry::new(twitter::DESCRIPTOR, twitter::resolve),
    ];

    let mut table = SkillTable::new();
    for entry in entries {
        let registered = table.register(entry);
        debug_assert!(registered.is_ok(), "duplicate built-in skill: {:?}", registered);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_table_order() {
        let names: Vec<&str> = builtin_table().list_skills().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["gemini_image", "grok_search", "v0_ui", "xai_analysis", "twitter"]
        );
    }

    #[test]
    fn test_builtin_tool_names_unique() {
        let mut seen = HashSet::new();
        for descriptor in builtin_table().list_skills() {
            for tool in descriptor.tool_names {
                assert!(seen.insert(*tool), "duplicate tool name {}", tool);
            }
        }
    }

    #[test]
    fn test_builtin_modules_match_descriptors() {
        let table = builtin_table();
        for descriptor in table.list_skills() {
            let module = table.get(descriptor.name).unwrap().resolve().unwrap();
            let names: Vec<String> = module.tools().into_iter().map(|t| t.name).collect();
            assert_eq!(names, descriptor.tool_names.to_vec(), "skill {}", descriptor.name);
        }
    }

    #[test]
    fn test_builtin_schemas_have_object_shape() {
        let table = builtin_table();
        for descriptor in table.list_skills() {
            let module = table.get(descriptor.name).unwrap().resolve().unwrap();
            for tool in module.tools() {
                assert_eq!(tool.parameters["type"], "object", "tool {}", tool.name);
                assert!(tool.parameters["properties"].is_object());
                for required in tool.required() {
                    assert!(
                        tool.parameters["properties"][required].is_object(),
                        "{} requires undeclared {}",
                        tool.name,
                        required
                    );
                }
            }
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut table = builtin_table();
        let err = table
            .register(SkillEntry::new(twitter::DESCRIPTOR, twitter::resolve))
            .unwrap_err();
        assert_eq!(err, SkillError::DuplicateSkill("twitter".to_string()));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_builtin_skill_names_unique() {
        let table = builtin_table();
        let names: HashSet<&str> = table.list_skills().iter().map(|d| d.name).collect();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn test_owner_of_tool() {
        let table = builtin_table();
        assert_eq!(table.owner_of_tool("generate_image").unwrap().name, "gemini_image");
        assert_eq!(table.owner_of_tool("analyze_token").unwrap().name, "xai_analysis");
        assert!(table.owner_of_tool("nope").is_none());
    }

    #[test]
    fn test_summaries_are_compact() {
        let summaries = builtin_table().summaries();
        assert_eq!(summaries.lines().count(), 5);
        assert!(summaries.contains("- **gemini_image**:"));
        assert!(summaries.contains("tools: post_tweet"));
    }
}
