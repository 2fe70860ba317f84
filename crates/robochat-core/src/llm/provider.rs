//! LanguageModel trait definition.
//!
//! The conversation layer treats the model and its tokenizer as one opaque
//! collaborator: text goes in as tokens, tokens come back, tokens are turned
//! back into text. Token counts are always the tokenizer's own answer.

use std::future::Future;

use robochat_types::llm::{GenerationRequest, LlmError};

/// Trait for causal language model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in robochat-infra (e.g., `LlamaServerProvider`).
pub trait LanguageModel: Send + Sync {
    /// Human-readable backend name (e.g., "llama-server").
    fn name(&self) -> &str;

    /// Maximum number of tokens the model accepts in one prompt.
    fn context_limit(&self) -> u32;

    /// Encode text into the model's token ids.
    fn tokenize(&self, text: &str) -> impl Future<Output = Result<Vec<u32>, LlmError>> + Send;

    /// Continue the prompt. Returns the prompt tokens followed by the newly
    /// generated ones, at most `request.max_length` tokens in total.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Vec<u32>, LlmError>> + Send;

    /// Decode token ids back into text, skipping special tokens.
    fn detokenize(&self, tokens: &[u32])
    -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Token count of `text` under this model's tokenizer.
    fn count_tokens(&self, text: &str) -> impl Future<Output = Result<u32, LlmError>> + Send {
        async move {
            let tokens = self.tokenize(text).await?;
            u32::try_from(tokens.len()).map_err(|_| LlmError::InvalidRequest(format!(
                "text too long to count: {} tokens",
                tokens.len()
            )))
        }
    }
}
