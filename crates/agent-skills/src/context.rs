//! Dependency context shared by every skill's executor factory
//!
//! The context is built once by the host, wrapped in an `Arc`, and handed to
//! `create_executors`. Skills only read from it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::devlog::DevlogWriter;
use crate::error::ApiError;

/// Default timeout for a single upstream HTTP call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Directory (relative to the work dir) where generated artifacts land
pub const GENERATED_DIR: &str = "public/generated";

/// Source of API credentials, consulted at call time
pub trait CredentialSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads credentials from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed credential map
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Base URLs of the upstream providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub gemini: String,
    pub xai: String,
    pub v0: String,
    pub twitter: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: "https://generativelanguage.googleapis.com".to_string(),
            xai: "https://api.x.ai".to_string(),
            v0: "https://api.v0.dev".to_string(),
            twitter: "https://api.twitter.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every provider at the same base URL (stub servers)
    pub fn uniform(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            gemini: base.clone(),
            xai: base.clone(),
            v0: base.clone(),
            twitter: base,
        }
    }
}

/// Shared, read-only configuration injected into every skill
pub struct SkillContext {
    work_dir: PathBuf,
    writer: Option<Arc<dyn DevlogWriter>>,
    credentials: Arc<dyn CredentialSource>,
    endpoints: Endpoints,
    http_timeout: Duration,
}

impl SkillContext {
    /// Context rooted at `work_dir`, reading credentials from the environment
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            writer: None,
            credentials: Arc::new(EnvCredentials),
            endpoints: Endpoints::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_writer(mut self, writer: Arc<dyn DevlogWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn writer(&self) -> Option<&Arc<dyn DevlogWriter>> {
        self.writer.as_ref()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// `<work_dir>/public/generated`
    pub fn generated_dir(&self) -> PathBuf {
        self.work_dir.join(GENERATED_DIR)
    }

    /// Look up a credential, failing softly when it is absent
    pub fn credential(&self, key: &str) -> Result<String, ApiError> {
        self.credentials
            .get(key)
            .ok_or_else(|| ApiError::MissingCredential(key.to_string()))
    }

    /// Build an HTTP client carrying the per-call timeout
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.http_timeout).build()
    }
}

impl fmt::Debug for SkillContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillContext")
            .field("work_dir", &self.work_dir)
            .field("writer", &self.writer.is_some())
            .field("endpoints", &self.endpoints)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = SkillContext::new("/tmp/work");
        assert_eq!(ctx.work_dir(), Path::new("/tmp/work"));
        assert_eq!(ctx.generated_dir(), PathBuf::from("/tmp/work/public/generated"));
        assert_eq!(ctx.http_timeout(), Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        assert!(ctx.writer().is_none());
        assert_eq!(ctx.endpoints(), &Endpoints::default());
    }

    #[test]
    fn test_static_credentials() {
        let ctx = SkillContext::new(".").with_credentials(Arc::new(
            StaticCredentials::new()
                .with("PRESENT_KEY", "secret")
                .with("BLANK_KEY", "  "),
        ));

        assert_eq!(ctx.credential("PRESENT_KEY").unwrap(), "secret");
        assert_eq!(
            ctx.credential("BLANK_KEY").unwrap_err().to_string(),
            "BLANK_KEY not configured in .env"
        );
        assert!(ctx.credential("ABSENT_KEY").is_err());
    }

    #[test]
    fn test_env_credentials_read_at_call_time() {
        let key = "AGENT_SKILLS_CONTEXT_TEST_KEY";
        std::env::remove_var(key);
        let ctx = SkillContext::new(".");
        assert!(ctx.credential(key).is_err());

        std::env::set_var(key, "late-value");
        assert_eq!(ctx.credential(key).unwrap(), "late-value");
        std::env::remove_var(key);
    }

    #[test]
    fn test_uniform_endpoints() {
        let endpoints = Endpoints::uniform("http://127.0.0.1:9999");
        assert_eq!(endpoints.gemini, "http://127.0.0.1:9999");
        assert_eq!(endpoints.twitter, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let ctx = SkillContext::new(".")
            .with_credentials(Arc::new(StaticCredentials::new().with("K", "super-secret")));
        let debug = format!("{:?}", ctx);
        assert!(!debug.contains("super-secret"));
    }
}
