//! Sampling options handed to the language model on every turn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Decoding configuration for a generation call.
///
/// The conversation layer never interprets these values; it passes them
/// through to the model collaborator as a bag. The named fields are the
/// options every backend is expected to understand, anything else lands in
/// [`extra`](Self::extra) and is forwarded verbatim.
///
/// When `do_sample` is false decoding is deterministic (greedy) and the
/// stochastic options (`temperature`, `top_k`, `top_p`) are ignored by the
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    /// Sampling randomness.
    pub temperature: f64,
    /// Candidate-pool size for top-k sampling.
    pub top_k: u32,
    /// Probability mass for nucleus sampling.
    pub top_p: f64,
    /// Penalty applied to tokens that already occurred.
    pub repetition_penalty: f64,
    /// How many candidates to produce. Only the first one is used.
    pub num_return_sequences: u32,
    /// Length bias for beam-style decoding.
    pub length_penalty: f64,
    /// Stochastic sampling when true, greedy decoding when false.
    pub do_sample: bool,
    /// Backend-specific options forwarded untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_k: 5,
            top_p: 0.95,
            repetition_penalty: 4.0,
            num_return_sequences: 1,
            length_penalty: 1.5,
            do_sample: false,
            extra: BTreeMap::new(),
        }
    }
}
