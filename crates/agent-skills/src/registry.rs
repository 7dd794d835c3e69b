// src/registry.rs
//! Loaded-skill registry and tool catalog
//!
//! One registry per process (or per test). It starts empty, gains entries as
//! skills are loaded, and never evicts. Only [`SkillRegistry::load_skill`]
//! mutates it; executors never touch it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::skills::{builtin_table, SkillDescriptor, SkillTable};
use crate::tool::{DynExecutor, ExecutorMap, ToolDefinition};

/// Default upper bound for one tool invocation
pub const DEFAULT_INVOKE_TIMEOUT_SECS: u64 = 120;

/// A skill after its factory has run
pub struct LoadedSkill {
    descriptor: SkillDescriptor,
    tools: Vec<ToolDefinition>,
    executors: ExecutorMap,
}

impl LoadedSkill {
    pub(crate) fn new(
        descriptor: SkillDescriptor,
        tools: Vec<ToolDefinition>,
        executors: ExecutorMap,
    ) -> Self {
        Self {
            descriptor,
            tools,
            executors,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn executor(&self, tool: &str) -> Option<&DynExecutor> {
        self.executors.get(tool)
    }
}

impl fmt::Debug for LoadedSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedSkill")
            .field("name", &self.descriptor.name)
            .field("tools", &self.tools.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Tool catalog entry: which skill owns the tool, and how to run it
#[derive(Clone)]
pub(crate) struct CatalogEntry {
    pub skill: &'static str,
    pub definition: ToolDefinition,
    pub executor: DynExecutor,
}

#[derive(Default)]
pub(crate) struct RegistryState {
    pub loaded: HashMap<&'static str, Arc<LoadedSkill>>,
    /// Tool names in publication order
    pub order: Vec<String>,
    pub catalog: HashMap<String, CatalogEntry>,
}

/// Skill registry: descriptor table, loaded skills and the tool catalog
pub struct SkillRegistry {
    pub(crate) table: SkillTable,
    pub(crate) state: RwLock<RegistryState>,
    pub(crate) load_locks: Mutex<HashMap<&'static str, Arc<Mutex<()>>>>,
    pub(crate) invoke_timeout: Duration,
}

impl SkillRegistry {
    pub fn new(table: SkillTable) -> Self {
        Self {
            table,
            state: RwLock::new(RegistryState::default()),
            load_locks: Mutex::new(HashMap::new()),
            invoke_timeout: Duration::from_secs(DEFAULT_INVOKE_TIMEOUT_SECS),
        }
    }

    /// Registry over the built-in skills
    pub fn builtin() -> Self {
        Self::new(builtin_table())
    }

    /// Bound every invocation; an executor exceeding it yields `Error: timeout`
    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    pub fn invoke_timeout(&self) -> Duration {
        self.invoke_timeout
    }

    pub fn table(&self) -> &SkillTable {
        &self.table
    }

    /// Every known skill, loaded or not
    pub fn list_skills(&self) -> Vec<SkillDescriptor> {
        self.table.list_skills()
    }

    pub async fn is_loaded(&self, skill: &str) -> bool {
        self.state.read().await.loaded.contains_key(skill)
    }

    /// Names of loaded skills
    pub async fn loaded_skills(&self) -> Vec<&'static str> {
        let state = self.state.read().await;
        let mut names: Vec<&'static str> = state.loaded.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Tool catalog: definitions of every loaded tool, in load order
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|name| state.catalog.get(name))
            .map(|entry| entry.definition.clone())
            .collect()
    }

    pub async fn has_tool(&self, tool: &str) -> bool {
        self.state.read().await.catalog.contains_key(tool)
    }

    /// Skill owning a loaded tool
    pub async fn owner_of(&self, tool: &str) -> Option<&'static str> {
        self.state.read().await.catalog.get(tool).map(|e| e.skill)
    }
}

impl fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillRegistry")
            .field("skills", &self.table.list_skills().iter().map(|d| d.name).collect::<Vec<_>>())
            .field("invoke_timeout", &self.invoke_timeout)
            .finish_non_exhaustive()
    }
}
