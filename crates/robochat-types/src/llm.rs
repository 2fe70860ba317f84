//! Request and error types for the language-model collaborator.

use crate::generation::GenerationParameters;

/// A single continuation request.
///
/// `max_length` counts the prompt too: the model may add at most
/// `max_length - prompt_tokens.len()` new tokens.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_tokens: Vec<u32>,
    pub max_length: u32,
    pub parameters: GenerationParameters,
}

impl GenerationRequest {
    /// Number of tokens the model is allowed to append to the prompt.
    pub fn new_token_allowance(&self) -> u32 {
        let prompt_len = u32::try_from(self.prompt_tokens.len()).unwrap_or(u32::MAX);
        self.max_length.saturating_sub(prompt_len)
    }
}

/// Errors from language-model operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("context length exceeded: max {max}, requested {requested}")]
    ContextLengthExceeded { max: u32, requested: u32 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_allowance() {
        let request = GenerationRequest {
            prompt_tokens: vec![1, 2, 3],
            max_length: 203,
            parameters: GenerationParameters::default(),
        };
        assert_eq!(request.new_token_allowance(), 200);
    }

    #[test]
    fn test_new_token_allowance_saturates() {
        let request = GenerationRequest {
            prompt_tokens: vec![1, 2, 3],
            max_length: 2,
            parameters: GenerationParameters::default(),
        };
        assert_eq!(request.new_token_allowance(), 0);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::ContextLengthExceeded {
            max: 2048,
            requested: 2300,
        };
        assert!(err.to_string().contains("2048"));
        assert!(err.to_string().contains("2300"));
    }
}
