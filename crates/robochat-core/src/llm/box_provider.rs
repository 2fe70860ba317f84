//! BoxLanguageModel -- object-safe dynamic dispatch wrapper for LanguageModel.
//!
//! 1. Define an object-safe `LanguageModelDyn` trait with boxed futures
//! 2. Blanket-impl `LanguageModelDyn` for all `T: LanguageModel`
//! 3. `BoxLanguageModel` wraps `Box<dyn LanguageModelDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use robochat_types::llm::{GenerationRequest, LlmError};

use super::provider::LanguageModel;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LlmError>> + Send + 'a>>;

/// Object-safe version of [`LanguageModel`] with boxed futures.
pub trait LanguageModelDyn: Send + Sync {
    fn name(&self) -> &str;

    fn context_limit(&self) -> u32;

    fn tokenize_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Vec<u32>>;

    fn generate_boxed<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Vec<u32>>;

    fn detokenize_boxed<'a>(&'a self, tokens: &'a [u32]) -> BoxFuture<'a, String>;

    fn count_tokens_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, u32>;
}

impl<T: LanguageModel> LanguageModelDyn for T {
    fn name(&self) -> &str {
        LanguageModel::name(self)
    }

    fn context_limit(&self) -> u32 {
        LanguageModel::context_limit(self)
    }

    fn tokenize_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Vec<u32>> {
        Box::pin(self.tokenize(text))
    }

    fn generate_boxed<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Vec<u32>> {
        Box::pin(self.generate(request))
    }

    fn detokenize_boxed<'a>(&'a self, tokens: &'a [u32]) -> BoxFuture<'a, String> {
        Box::pin(self.detokenize(tokens))
    }

    fn count_tokens_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, u32> {
        Box::pin(self.count_tokens(text))
    }
}

/// Type-erased language model for runtime backend selection.
///
/// `LanguageModel` uses RPITIT and cannot be a trait object directly, so
/// this wrapper exposes the same methods over a `LanguageModelDyn` box.
pub struct BoxLanguageModel {
    inner: Box<dyn LanguageModelDyn + Send + Sync>,
}

impl BoxLanguageModel {
    /// Wrap a concrete `LanguageModel` in a type-erased box.
    pub fn new<T: LanguageModel + 'static>(model: T) -> Self {
        Self {
            inner: Box::new(model),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn context_limit(&self) -> u32 {
        self.inner.context_limit()
    }

    pub async fn tokenize(&self, text: &str) -> Result<Vec<u32>, LlmError> {
        self.inner.tokenize_boxed(text).await
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u32>, LlmError> {
        self.inner.generate_boxed(request).await
    }

    pub async fn detokenize(&self, tokens: &[u32]) -> Result<String, LlmError> {
        self.inner.detokenize_boxed(tokens).await
    }

    pub async fn count_tokens(&self, text: &str) -> Result<u32, LlmError> {
        self.inner.count_tokens_boxed(text).await
    }
}
