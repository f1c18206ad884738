//! Error types for E2E commands

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Expected status {expected} but got {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    #[error("Expected property '{property}' to be '{expected}' but got '{actual}'")]
    PropertyMismatch {
        property: String,
        expected: String,
        actual: String,
    },

    #[error("Expected response body to have property '{property}'")]
    MissingProperty { property: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    #[error("Invalid arguments for '{command}': {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Broad class of a failure, as reported in test results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A UI element was missing or an interaction timed out
    UiInteraction,
    /// The system under test answered, but not as the contract requires
    ContractViolation,
    /// The test harness itself was misused or misconfigured
    Harness,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::ElementNotFound { .. }
            | E2eError::Timeout(_)
            | E2eError::Playwright(_)
            | E2eError::PlaywrightNotFound => FailureKind::UiInteraction,

            E2eError::StatusMismatch { .. }
            | E2eError::PropertyMismatch { .. }
            | E2eError::MissingProperty { .. }
            | E2eError::InvalidBody(_)
            | E2eError::Http(_) => FailureKind::ContractViolation,

            E2eError::UnknownCommand(_)
            | E2eError::DuplicateCommand(_)
            | E2eError::InvalidArguments { .. }
            | E2eError::SpecParse(_)
            | E2eError::ServerStartup(_)
            | E2eError::ServerHealthCheck(_)
            | E2eError::Config(_)
            | E2eError::Io(_)
            | E2eError::Json(_)
            | E2eError::Yaml(_) => FailureKind::Harness,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        let missing = E2eError::ElementNotFound { selector: "#username".into() };
        assert_eq!(missing.kind(), FailureKind::UiInteraction);

        let status = E2eError::StatusMismatch { expected: 200, actual: 500 };
        assert_eq!(status.kind(), FailureKind::ContractViolation);
        assert_eq!(status.to_string(), "Expected status 200 but got 500");

        assert_eq!(E2eError::UnknownCommand("x".into()).kind(), FailureKind::Harness);
    }
}
