//! Wire types for the llama.cpp server HTTP API.
//!
//! Only the fields robochat reads or writes are modelled; unknown response
//! fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /tokenize`.
#[derive(Debug, Serialize)]
pub struct TokenizeRequest<'a> {
    pub content: &'a str,
    pub add_special: bool,
}

#[derive(Debug, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<u32>,
}

/// Body of `POST /detokenize`.
#[derive(Debug, Serialize)]
pub struct DetokenizeRequest<'a> {
    pub tokens: &'a [u32],
}

#[derive(Debug, Deserialize)]
pub struct DetokenizeResponse {
    pub content: String,
}

/// Body of `POST /completion` (non-streaming).
#[derive(Debug, Serialize)]
pub struct CompletionBody {
    pub prompt: Vec<u32>,
    pub n_predict: u32,
    pub temperature: f64,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub repeat_penalty: f64,
    pub return_tokens: bool,
    pub cache_prompt: bool,
    pub stream: bool,
    /// Extra sampling options forwarded from the generation parameters.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    /// Generated token ids; only present when `return_tokens` was honoured.
    #[serde(default)]
    pub tokens: Vec<u32>,
    #[serde(default)]
    pub truncated: bool,
}

/// Response of `GET /props`. Older servers report `n_ctx` at the top level,
/// newer ones inside `default_generation_settings`.
#[derive(Debug, Default, Deserialize)]
pub struct PropsResponse {
    #[serde(default)]
    pub n_ctx: Option<u32>,
    #[serde(default)]
    pub default_generation_settings: Option<GenerationSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub n_ctx: Option<u32>,
}

impl PropsResponse {
    pub fn context_size(&self) -> Option<u32> {
        self.default_generation_settings
            .as_ref()
            .and_then(|s| s.n_ctx)
            .or(self.n_ctx)
    }
}
