// src/error.rs
//! Error types
//!
//! Two layers:
//! - [`SkillError`]: contract errors that propagate to the caller of the
//!   loader or dispatcher.
//! - [`ApiError`]: failures inside an executor. These never propagate; the
//!   executor renders them into an `Error: ...` tool output.

use thiserror::Error;

/// Registry-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Failed to load skill '{skill}': {reason}")]
    SkillLoad { skill: String, reason: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Skill already registered: {0}")]
    DuplicateSkill(String),
}

impl SkillError {
    pub fn load(skill: impl Into<String>, reason: impl Into<String>) -> Self {
        SkillError::SkillLoad {
            skill: skill.into(),
            reason: reason.into(),
        }
    }
}

/// Typed errors for the upstream APIs behind each skill
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not configured in .env")]
    MissingCredential(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized - check API key")]
    Unauthorized,

    #[error("Rate limited - too many requests")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Classify a transport-level reqwest failure
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Connection(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized,
            429 => ApiError::RateLimited,
            400 => ApiError::BadRequest(body),
            500..=599 => ApiError::ServerError(status, body),
            _ => ApiError::HttpError(status, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message() {
        let err = ApiError::MissingCredential("GEMINI_API_KEY".to_string());
        assert_eq!(err.to_string(), "GEMINI_API_KEY not configured in .env");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(ApiError::from_status(401, String::new()), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(429, String::new()), ApiError::RateLimited));
        assert!(matches!(ApiError::from_status(400, "bad".into()), ApiError::BadRequest(_)));
        assert!(matches!(ApiError::from_status(503, String::new()), ApiError::ServerError(503, _)));
        assert!(matches!(ApiError::from_status(404, String::new()), ApiError::HttpError(404, _)));
    }

    #[test]
    fn test_skill_load_display() {
        let err = SkillError::load("gemini_image", "client build failed");
        assert_eq!(
            err.to_string(),
            "Failed to load skill 'gemini_image': client build failed"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ApiError = io.into();
        assert!(err.to_string().starts_with("File system error"));
    }
}
