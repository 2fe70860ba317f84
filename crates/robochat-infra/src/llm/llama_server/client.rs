//! LlamaServerProvider -- concrete [`LanguageModel`] for a llama.cpp server.
//!
//! Tokenization, generation and detokenization all go through the server so
//! that token counts always match the loaded model's vocabulary. The
//! optional API key is wrapped in [`secrecy::SecretString`] and only exposed
//! when building the `Authorization` header.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use robochat_core::llm::provider::LanguageModel;
use robochat_types::config::ProviderSettings;
use robochat_types::generation::GenerationParameters;
use robochat_types::llm::{GenerationRequest, LlmError};

use super::types::{
    CompletionBody, CompletionResponse, DetokenizeRequest, DetokenizeResponse, PropsResponse,
    TokenizeRequest, TokenizeResponse,
};

/// Context size assumed when the server does not report one.
pub const FALLBACK_CONTEXT_LIMIT: u32 = 2048;

/// HTTP client for a llama.cpp-compatible completion server.
pub struct LlamaServerProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    add_special_tokens: bool,
    context_limit: u32,
}

impl LlamaServerProvider {
    /// Build a provider with a known context limit. Does not touch the network.
    pub fn new(settings: &ProviderSettings, context_limit: u32) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().map(SecretString::from),
            add_special_tokens: settings.add_special_tokens,
            context_limit,
        })
    }

    /// Build a provider and, unless `context_limit` is given, ask the server
    /// for its context size via `GET /props`.
    pub async fn connect(
        settings: &ProviderSettings,
        context_limit: Option<u32>,
    ) -> Result<Self, LlmError> {
        let mut provider = Self::new(settings, context_limit.unwrap_or(FALLBACK_CONTEXT_LIMIT))?;
        if context_limit.is_none() {
            match provider.fetch_props().await?.context_size() {
                Some(n_ctx) if n_ctx > 0 => provider.context_limit = n_ctx,
                _ => tracing::warn!(
                    fallback = FALLBACK_CONTEXT_LIMIT,
                    "server did not report a context size"
                ),
            }
        }
        Ok(provider)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    async fn fetch_props(&self) -> Result<PropsResponse, LlmError> {
        let response = self
            .authorize(self.client.get(self.url("/props")))
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }
}

impl LanguageModel for LlamaServerProvider {
    fn name(&self) -> &str {
        "llama-server"
    }

    fn context_limit(&self) -> u32 {
        self.context_limit
    }

    async fn tokenize(&self, text: &str) -> Result<Vec<u32>, LlmError> {
        let body = TokenizeRequest {
            content: text,
            add_special: self.add_special_tokens,
        };
        let resp: TokenizeResponse = self.post("/tokenize", &body).await?;
        Ok(resp.tokens)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u32>, LlmError> {
        let mut body = build_completion_request(request);
        let dropped = fit_to_context(&mut body, self.context_limit);
        if dropped > 0 {
            tracing::warn!(
                dropped,
                context_limit = self.context_limit,
                "prompt and reply exceed the context size; dropping oldest prompt tokens"
            );
        }
        tracing::debug!(
            prompt_tokens = body.prompt.len(),
            n_predict = body.n_predict,
            "requesting completion"
        );
        let resp: CompletionResponse = self.post("/completion", &body).await?;
        if resp.truncated {
            tracing::warn!("server truncated the prompt");
        }

        let generated = if resp.tokens.is_empty() && !resp.content.is_empty() {
            // Older servers ignore `return_tokens`.
            self.tokenize(&resp.content).await?
        } else {
            resp.tokens
        };

        let mut tokens = request.prompt_tokens.clone();
        let room = usize::try_from(body.n_predict).unwrap_or(usize::MAX);
        tokens.extend(generated.into_iter().take(room));
        Ok(tokens)
    }

    async fn detokenize(&self, tokens: &[u32]) -> Result<String, LlmError> {
        let resp: DetokenizeResponse = self
            .post("/detokenize", &DetokenizeRequest { tokens })
            .await?;
        Ok(resp.content)
    }
}

/// Translate a generation request into the server's `/completion` body.
///
/// Greedy decoding is expressed as `temperature = 0, top_k = 1` with the
/// nucleus option left out, since the server has no `do_sample` switch.
pub fn build_completion_request(request: &GenerationRequest) -> CompletionBody {
    let GenerationParameters {
        temperature,
        top_k,
        top_p,
        repetition_penalty,
        num_return_sequences,
        length_penalty,
        do_sample,
        extra,
    } = &request.parameters;

    if *num_return_sequences != 1 || *length_penalty != 1.0 {
        tracing::debug!(
            num_return_sequences,
            length_penalty,
            "options without a server counterpart are ignored"
        );
    }

    let (temperature, top_k, top_p) = if *do_sample {
        (*temperature, *top_k, Some(*top_p))
    } else {
        (0.0, 1, None)
    };

    CompletionBody {
        prompt: request.prompt_tokens.clone(),
        n_predict: request.new_token_allowance(),
        temperature,
        top_k,
        top_p,
        repeat_penalty: *repetition_penalty,
        return_tokens: true,
        cache_prompt: true,
        stream: false,
        extra: extra.clone(),
    }
}

/// Make prompt plus reply fit in `context_limit` tokens.
///
/// The reply allowance is capped at half the context, then the oldest
/// prompt tokens are dropped until the rest fits. Returns how many prompt
/// tokens were dropped.
pub fn fit_to_context(body: &mut CompletionBody, context_limit: u32) -> usize {
    body.n_predict = body.n_predict.min(context_limit / 2);
    let budget = usize::try_from(context_limit - body.n_predict).unwrap_or(usize::MAX);
    let excess = body.prompt.len().saturating_sub(budget);
    body.prompt.drain(..excess);
    excess
}

/// Map a non-success HTTP status to an [`LlmError`].
pub fn map_status(status: StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        400 => LlmError::InvalidRequest(body),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        503 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

fn transport_error(err: reqwest::Error) -> LlmError {
    LlmError::Provider {
        message: format!("HTTP request failed: {err}"),
    }
}

async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(map_status(status, error_body));
    }
    response
        .json()
        .await
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))
}
