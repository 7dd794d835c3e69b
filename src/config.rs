//! # Configuration Module
//!
//! Loads the agent's settings from the environment (after `.env`) and turns
//! them into the pieces the skill registry needs: a work directory, HTTP and
//! invocation timeouts, and provider endpoints.
//!
//! API keys are not part of the config; skills read them at call time.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use agent_skills::context::DEFAULT_HTTP_TIMEOUT_SECS;
use agent_skills::{Endpoints, DEFAULT_INVOKE_TIMEOUT_SECS};

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the agent host.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root for generated images, research logs and the journal
    pub work_dir: PathBuf,

    /// Anthropic model driving the conversation
    pub model: String,

    /// Upper bound on tool-calling rounds per prompt
    pub max_turns: usize,

    /// Timeout for one upstream HTTP call made by a skill
    pub http_timeout_secs: u64,

    /// Timeout for one whole tool invocation
    pub invoke_timeout_secs: u64,

    /// Provider base URLs
    pub endpoints: Endpoints,
}

// =============================================================================
// DEFAULT IMPLEMENTATION
// =============================================================================
impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            model: "claude-sonnet-4-5".to_string(),
            max_turns: 8,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            invoke_timeout_secs: DEFAULT_INVOKE_TIMEOUT_SECS,
            endpoints: Endpoints::default(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Rust Concept: The ? Operator with Context
    ///
    /// `.context()` wraps a parse error with the variable that caused it, so
    /// a typo in `.env` reports `AGENT_MAX_TURNS must be ...` instead of a
    /// bare "invalid digit found in string".
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (silently ignore if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(val) = get("AGENT_WORK_DIR") {
            config.work_dir = PathBuf::from(val);
        }

        if let Some(val) = get("ANTHROPIC_MODEL") {
            config.model = val;
        }

        if let Some(val) = get("AGENT_MAX_TURNS") {
            config.max_turns = val
                .trim()
                .parse()
                .context("AGENT_MAX_TURNS must be a valid positive integer")?;
        }

        if let Some(val) = get("SKILL_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = val
                .trim()
                .parse()
                .context("SKILL_HTTP_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        if let Some(val) = get("SKILL_INVOKE_TIMEOUT_SECS") {
            config.invoke_timeout_secs = val
                .trim()
                .parse()
                .context("SKILL_INVOKE_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        // Endpoint overrides, mostly for staging proxies and local stubs
        if let Some(val) = get("GEMINI_API_BASE") {
            config.endpoints.gemini = val;
        }
        if let Some(val) = get("XAI_API_BASE") {
            config.endpoints.xai = val;
        }
        if let Some(val) = get("V0_API_BASE") {
            config.endpoints.v0 = val;
        }
        if let Some(val) = get("TWITTER_API_BASE") {
            config.endpoints.twitter = val;
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            anyhow::bail!("ANTHROPIC_MODEL cannot be empty");
        }

        if self.max_turns == 0 {
            anyhow::bail!("AGENT_MAX_TURNS must be at least 1");
        }

        if self.http_timeout_secs == 0 {
            anyhow::bail!("SKILL_HTTP_TIMEOUT_SECS must be at least 1");
        }

        if self.invoke_timeout_secs == 0 {
            anyhow::bail!("SKILL_INVOKE_TIMEOUT_SECS must be at least 1");
        }

        // A whole invocation covers at least one HTTP call
        if self.invoke_timeout_secs < self.http_timeout_secs {
            anyhow::bail!(
                "SKILL_INVOKE_TIMEOUT_SECS ({}) must not be shorter than SKILL_HTTP_TIMEOUT_SECS ({})",
                self.invoke_timeout_secs,
                self.http_timeout_secs
            );
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_secs(self.invoke_timeout_secs)
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.work_dir, PathBuf::from("."));
        assert_eq!(config.model, "claude-sonnet-4-5");
        assert_eq!(config.max_turns, 8);
        assert_eq!(config.http_timeout(), Duration::from_secs(60));
        assert_eq!(config.invoke_timeout(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AGENT_WORK_DIR", "/srv/meme"),
            ("ANTHROPIC_MODEL", "claude-opus-4-1"),
            ("AGENT_MAX_TURNS", " 3 "),
            ("SKILL_HTTP_TIMEOUT_SECS", "10"),
            ("SKILL_INVOKE_TIMEOUT_SECS", "30"),
            ("XAI_API_BASE", "http://localhost:8080"),
        ]))
        .unwrap();

        assert_eq!(config.work_dir, PathBuf::from("/srv/meme"));
        assert_eq!(config.model, "claude-opus-4-1");
        assert_eq!(config.max_turns, 3);
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.invoke_timeout_secs, 30);
        assert_eq!(config.endpoints.xai, "http://localhost:8080");
        assert_eq!(config.endpoints.gemini, Endpoints::default().gemini);
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_MODEL", "  ")])).unwrap();
        assert_eq!(config.model, "claude-sonnet-4-5");
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup(&[("AGENT_MAX_TURNS", "many")])).unwrap_err();
        assert!(err.to_string().contains("AGENT_MAX_TURNS"));
    }

    #[test]
    fn test_validation_rejects_zero() {
        let mut config = Config::default();
        config.max_turns = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.http_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invoke_shorter_than_http() {
        let mut config = Config::default();
        config.invoke_timeout_secs = 30;
        config.http_timeout_secs = 60;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not be shorter"));
    }
}
