//! Error taxonomy shared by every component.
//!
//! Each variant renders as the short message the user sees. Components
//! return these instead of printing and bailing; the front end prints the
//! message once and ends the command cleanly.

use thiserror::Error;

/// A configuration value that is missing or cannot be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("${name} should be {expected}")]
    Invalid { name: String, expected: &'static str },

    #[error("You haven't set ${name}!")]
    Missing { name: String },

    #[error("could not read {path}: {reason}")]
    File { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum UhuError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(
        "The naming service took too long to answer. Raise $XONSH_UHU_OLLAMA_TIMEOUT if your machine needs more time."
    )]
    ServiceTimeout,

    #[error("Ollama error! {}", protocol_detail(.status, .detail))]
    ServiceProtocol { status: Option<u16>, detail: String },

    #[error("The LLM would not come up with a usable name after {tries} tries.")]
    ExhaustedAttempts { tries: usize },

    #[error("There's no history! Nothing to shorten.")]
    EmptyHistory,

    #[error("No shortcut named '{0}'")]
    UnknownAlias(String),

    #[error("Bad human! Tried to shadow '{0}'")]
    NameCollision(String),

    #[error("shell integration failed: {0}")]
    Host(String),
}

fn protocol_detail(status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(code) => format!("HTTP {code}:\n{detail}"),
        None => detail.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, UhuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_variable_and_type() {
        let err = ConfigError::Invalid {
            name: "XONSH_UHU_MAX_LLM_TRIES".to_string(),
            expected: "an INTEGER",
        };
        assert_eq!(err.to_string(), "$XONSH_UHU_MAX_LLM_TRIES should be an INTEGER");
    }

    #[test]
    fn test_protocol_error_includes_status_and_body() {
        let err = UhuError::ServiceProtocol {
            status: Some(500),
            detail: "model not found".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("HTTP 500"));
        assert!(message.contains("model not found"));
    }

    #[test]
    fn test_protocol_error_without_status() {
        let err = UhuError::ServiceProtocol {
            status: None,
            detail: "missing field `shortname`".to_string(),
        };
        assert_eq!(err.to_string(), "Ollama error! missing field `shortname`");
    }

    #[test]
    fn test_config_error_converts_into_uhu_error() {
        let err: UhuError = ConfigError::Missing {
            name: "XONSH_UHU_MODEL_NAME".to_string(),
        }
        .into();
        assert!(matches!(err, UhuError::Config(ConfigError::Missing { .. })));
        assert_eq!(err.to_string(), "You haven't set $XONSH_UHU_MODEL_NAME!");
    }
}
