use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised while running a conversation turn.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("malformed query template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("invalid narrative stem pattern: {0}")]
    InvalidStemPattern(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_template_display() {
        let err = ConversationError::MalformedTemplate {
            template: "asked you.".to_string(),
            reason: "no substitution slot".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed query template 'asked you.': no substitution slot"
        );
    }

    #[test]
    fn test_llm_error_is_transparent() {
        let err: ConversationError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("max_phrases must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_phrases must be at least 1"
        );
    }
}
