//! Language model backend implementations.
//!
//! Contains concrete implementations of the [`LanguageModel`] trait defined
//! in `robochat-core`, plus [`create_model`] which builds the boxed backend
//! the CLI hands to the conversation engine.
//!
//! [`LanguageModel`]: robochat_core::llm::provider::LanguageModel

pub mod llama_server;

use robochat_core::llm::box_provider::BoxLanguageModel;
use robochat_core::llm::provider::LanguageModel;
use robochat_types::config::ProviderSettings;
use robochat_types::llm::LlmError;

use self::llama_server::LlamaServerProvider;

/// Connect to the configured model server and box it for the engine.
///
/// When `context_limit` is `None` the server is asked for its context size.
pub async fn create_model(
    settings: &ProviderSettings,
    context_limit: Option<u32>,
) -> Result<BoxLanguageModel, LlmError> {
    let provider = LlamaServerProvider::connect(settings, context_limit).await?;
    tracing::info!(
        base_url = %settings.base_url,
        context_limit = provider.context_limit(),
        "connected to model server"
    );
    Ok(BoxLanguageModel::new(provider))
}
