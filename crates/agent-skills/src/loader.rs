// src/loader.rs
//! On-demand skill loading

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::context::SkillContext;
use crate::error::SkillError;
use crate::registry::{CatalogEntry, LoadedSkill, SkillRegistry};

impl SkillRegistry {
    /// Load a skill and publish its tools to the catalog.
    ///
    /// Idempotent: a loaded skill returns the cached handle. Concurrent first
    /// loads of the same skill are serialized, so the factory runs once.
    /// Failed loads leave the registry untouched.
    pub async fn load_skill(
        &self,
        name: &str,
        ctx: &Arc<SkillContext>,
    ) -> Result<Arc<LoadedSkill>, SkillError> {
        let entry = self
            .table
            .get(name)
            .ok_or_else(|| SkillError::UnknownSkill(name.to_string()))?;
        let descriptor = entry.descriptor;

        if let Some(loaded) = self.state.read().await.loaded.get(descriptor.name) {
            return Ok(Arc::clone(loaded));
        }

        let lock = {
            let mut locks = self.load_locks.lock().await;
            Arc::clone(
                locks
                    .entry(descriptor.name)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let _guard = lock.lock().await;

        // Another task may have finished the load while we waited
        if let Some(loaded) = self.state.read().await.loaded.get(descriptor.name) {
            debug!(skill = descriptor.name, "Skill loaded concurrently, reusing handle");
            return Ok(Arc::clone(loaded));
        }

        debug!(skill = descriptor.name, "Resolving skill module");
        let module = entry.resolve().map_err(|e| wrap_load_error(descriptor.name, e))?;
        let tools = module.tools();

        let declared: HashSet<&str> = descriptor.tool_names.iter().copied().collect();
        let provided: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        if declared != provided || tools.len() != provided.len() {
            let mut provided: Vec<&str> = provided.into_iter().collect();
            provided.sort_unstable();
            return Err(SkillError::load(
                descriptor.name,
                format!(
                    "module tools [{}] do not match advertised tools [{}]",
                    provided.join(", "),
                    descriptor.tool_names.join(", ")
                ),
            ));
        }

        let executors = module
            .create_executors(Arc::clone(ctx))
            .map_err(|e| wrap_load_error(descriptor.name, e))?;

        for tool in &tools {
            if !executors.contains_key(&tool.name) {
                return Err(SkillError::load(
                    descriptor.name,
                    format!("no executor for tool '{}'", tool.name),
                ));
            }
        }

        let mut state = self.state.write().await;

        for tool in &tools {
            if let Some(existing) = state.catalog.get(&tool.name) {
                warn!(
                    skill = descriptor.name,
                    tool = %tool.name,
                    owner = existing.skill,
                    "Tool name collision, rejecting load"
                );
                return Err(SkillError::load(
                    descriptor.name,
                    format!(
                        "tool '{}' is already registered by skill '{}'",
                        tool.name, existing.skill
                    ),
                ));
            }
        }

        for tool in &tools {
            let executor = Arc::clone(&executors[&tool.name]);
            state.order.push(tool.name.clone());
            state.catalog.insert(
                tool.name.clone(),
                CatalogEntry {
                    skill: descriptor.name,
                    definition: tool.clone(),
                    executor,
                },
            );
        }

        let loaded = Arc::new(LoadedSkill::new(descriptor, tools, executors));
        state.loaded.insert(descriptor.name, Arc::clone(&loaded));

        info!(
            skill = descriptor.name,
            tools = descriptor.tool_names.len(),
            "Skill loaded"
        );

        Ok(loaded)
    }

    /// Load the skill advertising `tool`, as a host does before invoking it
    pub async fn load_tool_owner(
        &self,
        tool: &str,
        ctx: &Arc<SkillContext>,
    ) -> Result<Arc<LoadedSkill>, SkillError> {
        let owner = self
            .table
            .owner_of_tool(tool)
            .ok_or_else(|| SkillError::ToolNotFound(tool.to_string()))?;
        self.load_skill(owner.name, ctx).await
    }
}

fn wrap_load_error(skill: &str, e: SkillError) -> SkillError {
    match e {
        SkillError::SkillLoad { .. } => e,
        other => SkillError::load(skill, other.to_string()),
    }
}
