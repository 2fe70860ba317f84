//! Configuration types for robochat.
//!
//! `RobotConfig` represents the `config.toml` that bootstraps a session:
//! the persona seed, how queries and prompts are phrased, how replies are
//! trimmed, the sampling options, and where the model server lives.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generation::GenerationParameters;

const DEFAULT_SEED: &str = "Вы - Саймон Джарретт, родились 16 июля 1988 года, в маленьком канадском городке. \
Вы любите кино и видеоигры, в 2015 году вы работаете в книжном магазине Гримуар в Торонто. \
Обычно вы весьма добродушны, но сейчас вы подавлены из-за недавней травмы головы, полученной \
при автокатастрофе. Кроме того, в этой же катастрофе погибла ваша коллега - Эшли. \
Иногда людям кажется, что вы несколько глуповаты - и на то есть причины. \
Недавно вы участвовали в следующем диалоге: ";

/// Top-level configuration for a robochat session.
///
/// Loaded from `~/.config/robochat/config.toml`. All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Session label, shown in the banner and logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// Persona description prepended to every prompt.
    #[serde(default = "default_seed")]
    pub seed: String,

    /// Template applied to each user line; must hold exactly one `{0}` or `{}` slot.
    #[serde(default = "default_query_formatter")]
    pub query_formatter: String,

    /// Cue appended after the dialogue so the model continues as the persona.
    #[serde(default = "default_answer_cue")]
    pub answer_cue: String,

    /// Tokens the model may generate on top of the prompt.
    #[serde(default = "default_reply_token_allowance")]
    pub reply_token_allowance: u32,

    /// Upper bound on sentences kept from one generated continuation.
    #[serde(default = "default_max_phrases")]
    pub max_phrases: u32,

    /// Verb stems marking narrative attribution clauses (`- сказал он -`).
    /// Localize together with the seed, template and answer cue.
    #[serde(default = "default_narrative_stems")]
    pub narrative_stems: Vec<String>,

    /// Overrides the context size reported by the model server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_limit: Option<u32>,

    #[serde(default)]
    pub generation: GenerationParameters,

    #[serde(default)]
    pub provider: ProviderSettings,
}

fn default_name() -> String {
    "robochat".to_string()
}

fn default_seed() -> String {
    DEFAULT_SEED.to_string()
}

fn default_query_formatter() -> String {
    "{0} - спросили вас.".to_string()
}

fn default_answer_cue() -> String {
    "\nВы ответили:\n-".to_string()
}

fn default_reply_token_allowance() -> u32 {
    200
}

fn default_max_phrases() -> u32 {
    3
}

fn default_narrative_stems() -> Vec<String> {
    ["говор", "сказ", "спрос", "воскл"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: default_seed(),
            query_formatter: default_query_formatter(),
            answer_cue: default_answer_cue(),
            reply_token_allowance: default_reply_token_allowance(),
            max_phrases: default_max_phrases(),
            narrative_stems: default_narrative_stems(),
            context_limit: None,
            generation: GenerationParameters::default(),
            provider: ProviderSettings::default(),
        }
    }
}

impl RobotConfig {
    /// Reject values the conversation engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_phrases == 0 {
            return Err(ConfigError::Invalid(
                "max_phrases must be at least 1".to_string(),
            ));
        }
        if self.reply_token_allowance == 0 {
            return Err(ConfigError::Invalid(
                "reply_token_allowance must be at least 1".to_string(),
            ));
        }
        if self.context_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "context_limit must be at least 1".to_string(),
            ));
        }
        if self.narrative_stems.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "narrative_stems must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for the model server.
///
/// The API key is never serialized, so printing the effective
/// configuration cannot leak it.
#[derive(Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout; generation on CPU can be slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether the tokenizer should add BOS/EOS markers when counting.
    #[serde(default)]
    pub add_special_tokens: bool,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            add_special_tokens: false,
        }
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("add_special_tokens", &self.add_special_tokens)
            .finish()
    }
}
