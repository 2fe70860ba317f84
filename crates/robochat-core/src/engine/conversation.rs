//! ConversationEngine -- one dialogue turn from user line to clean reply.
//!
//! A turn is strictly sequential: template the query, admit it into the
//! context window, generate a continuation, sanitize it, record the reply.
//! Model failures propagate unchanged; nothing here retries.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Instrument, debug, info, info_span, warn};

use robochat_types::config::RobotConfig;
use robochat_types::conversation::{ConversationState, Phrase};
use robochat_types::error::ConversationError;
use robochat_types::generation::GenerationParameters;
use robochat_types::llm::GenerationRequest;

use crate::context::window::ContextWindow;
use crate::llm::box_provider::BoxLanguageModel;
use crate::text::sanitize::OutputSanitizer;

use super::template::QueryFormatter;

/// Default number of tokens the model may add on top of the prompt.
pub const DEFAULT_REPLY_TOKEN_ALLOWANCE: u32 = 200;

/// Drives conversation turns against a language model.
///
/// The engine owns no conversation state; callers hand in the
/// [`ConversationState`] of the session they are serving, one turn at a
/// time.
pub struct ConversationEngine {
    model: BoxLanguageModel,
    formatter: QueryFormatter,
    window: ContextWindow,
    sanitizer: OutputSanitizer,
    parameters: GenerationParameters,
    reply_token_allowance: u32,
    rng: StdRng,
}

impl ConversationEngine {
    /// Build an engine from its parts.
    ///
    /// The phrase-count random source is seeded from OS entropy; use
    /// [`with_rng`](Self::with_rng) for reproducible replies.
    pub fn new(
        model: BoxLanguageModel,
        formatter: QueryFormatter,
        window: ContextWindow,
        sanitizer: OutputSanitizer,
        parameters: GenerationParameters,
    ) -> Self {
        Self {
            model,
            formatter,
            window,
            sanitizer,
            parameters,
            reply_token_allowance: DEFAULT_REPLY_TOKEN_ALLOWANCE,
            rng: StdRng::from_entropy(),
        }
    }

    /// Build an engine from configuration.
    ///
    /// Fails when the query template or the narrative stems are malformed.
    /// The context limit comes from the model unless the config overrides it.
    pub fn from_config(
        model: BoxLanguageModel,
        config: &RobotConfig,
    ) -> Result<Self, ConversationError> {
        let formatter = QueryFormatter::new(&config.query_formatter)?;
        let sanitizer =
            OutputSanitizer::new(config.narrative_stems.as_slice(), config.max_phrases)?;
        let context_limit = config.context_limit.unwrap_or_else(|| model.context_limit());
        let window = ContextWindow::new(context_limit).with_answer_cue(config.answer_cue.clone());

        Ok(
            Self::new(model, formatter, window, sanitizer, config.generation.clone())
                .with_reply_token_allowance(config.reply_token_allowance),
        )
    }

    pub fn with_reply_token_allowance(mut self, allowance: u32) -> Self {
        self.reply_token_allowance = allowance;
        self
    }

    /// Replace the phrase-count random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Shorthand for a deterministic random source.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    /// Start a session for `name` with the persona `seed`.
    ///
    /// Counts the seed's tokens once; the count travels with the seed for
    /// the rest of the session.
    pub async fn start_session(
        &self,
        name: &str,
        seed: &str,
    ) -> Result<ConversationState, ConversationError> {
        let seed_tokens = self.model.count_tokens(seed).await?;
        if seed_tokens >= self.window.context_limit() {
            warn!(
                seed_tokens,
                context_limit = self.window.context_limit(),
                "seed alone exceeds the context limit; no history will be kept"
            );
        }
        Ok(ConversationState::new(name, Phrase::new(seed, seed_tokens)))
    }

    /// Answer `user_phrase` in the context of `state`.
    ///
    /// On success the state has grown by the templated query and the reply
    /// (minus whatever the window evicted). On a model error the query may
    /// already be in the history; the error is returned as is.
    pub async fn answer(
        &mut self,
        user_phrase: &str,
        state: &mut ConversationState,
    ) -> Result<String, ConversationError> {
        let span = info_span!(
            "robochat.answer",
            session = %state.name(),
            backend = self.model.name(),
            context_limit = self.window.context_limit(),
        );
        self.run_turn(user_phrase, state).instrument(span).await
    }

    async fn run_turn(
        &mut self,
        user_phrase: &str,
        state: &mut ConversationState,
    ) -> Result<String, ConversationError> {
        let query = self.formatter.format(user_phrase);
        let query_tokens = self.model.count_tokens(&query).await?;
        let prompt = self.window.admit(Phrase::new(query, query_tokens), state);

        let continuation = self.continue_prompt(&prompt).await?;
        let reply = self.sanitizer.sanitize(&continuation, &mut self.rng);

        let reply_tokens = self.model.count_tokens(&reply).await?;
        state.push(Phrase::new(reply.clone(), reply_tokens));

        info!(
            query_tokens,
            reply_tokens,
            history_len = state.history().len(),
            "turn complete"
        );
        Ok(reply)
    }

    /// Generate from `prompt` and return only the new text.
    ///
    /// The window budgets phrase tokens only; the `- ` prefixes, newlines
    /// and answer cue added when rendering can push the tokenized prompt
    /// past the context limit. Such a prompt loses its oldest tokens.
    async fn continue_prompt(&self, prompt: &str) -> Result<String, ConversationError> {
        let mut prompt_tokens = self.model.tokenize(prompt).await?;
        let dropped = truncate_front(&mut prompt_tokens, self.window.context_limit());
        if dropped > 0 {
            debug!(dropped, "rendered prompt exceeds the context limit; dropping oldest tokens");
        }

        let prompt_len = u32::try_from(prompt_tokens.len()).unwrap_or(u32::MAX);
        let request = GenerationRequest {
            prompt_tokens,
            max_length: prompt_len.saturating_add(self.reply_token_allowance),
            parameters: self.parameters.clone(),
        };
        debug!(prompt_len, max_length = request.max_length, "requesting continuation");

        let output = self.model.generate(&request).await?;

        if dropped == 0 {
            let decoded = self.model.detokenize(&output).await?;
            if let Some(continuation) = strip_prompt(&decoded, prompt) {
                return Ok(continuation);
            }
            // Detokenizing did not reproduce the prompt text byte for byte.
            warn!("decoded output does not start with the prompt; decoding new tokens only");
        }

        let new_tokens = output.get(request.prompt_tokens.len()..).unwrap_or_default();
        let continuation = self.model.detokenize(new_tokens).await?;
        Ok(continuation.trim().to_string())
    }
}

/// Drop tokens from the front until at most `limit` remain. Returns how many
/// were dropped.
pub fn truncate_front(tokens: &mut Vec<u32>, limit: u32) -> usize {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let excess = tokens.len().saturating_sub(limit);
    tokens.drain(..excess);
    excess
}

/// Remove the echoed prompt from the front of decoded model output.
///
/// Both sides are whitespace-trimmed before matching, and the continuation
/// is trimmed afterwards. Returns `None` when the output does not start
/// with the prompt.
pub fn strip_prompt(decoded: &str, prompt: &str) -> Option<String> {
    decoded
        .trim()
        .strip_prefix(prompt.trim())
        .map(|rest| rest.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use robochat_types::llm::LlmError;

    use super::*;
    use crate::llm::provider::LanguageModel;

    /// One token per character; generation appends a scripted continuation.
    struct ScriptedModel {
        context_limit: u32,
        continuation: String,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedModel {
        fn new(context_limit: u32, continuation: &str) -> Self {
            Self {
                context_limit,
                continuation: continuation.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    fn encode(text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode(tokens: &[u32]) -> String {
        tokens.iter().filter_map(|t| char::from_u32(*t)).collect()
    }

    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        fn context_limit(&self) -> u32 {
            self.context_limit
        }

        async fn tokenize(&self, text: &str) -> Result<Vec<u32>, LlmError> {
            Ok(encode(text))
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u32>, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            let requested = request.prompt_tokens.len() as u32;
            if requested > self.context_limit {
                return Err(LlmError::ContextLengthExceeded {
                    max: self.context_limit,
                    requested,
                });
            }
            let mut out = request.prompt_tokens.clone();
            out.extend(encode(&self.continuation));
            out.truncate(request.max_length as usize);
            Ok(out)
        }

        async fn detokenize(&self, tokens: &[u32]) -> Result<String, LlmError> {
            Ok(decode(tokens))
        }
    }

    /// Tokenizes fine, fails to generate.
    struct FailingModel;

    impl LanguageModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn context_limit(&self) -> u32 {
            1024
        }

        async fn tokenize(&self, text: &str) -> Result<Vec<u32>, LlmError> {
            Ok(encode(text))
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<u32>, LlmError> {
            Err(LlmError::Overloaded("device busy".to_string()))
        }

        async fn detokenize(&self, tokens: &[u32]) -> Result<String, LlmError> {
            Ok(decode(tokens))
        }
    }

    /// Generates only new tokens and decodes with a leading space, so the
    /// prompt never shows up verbatim in the output.
    struct NoEchoModel;

    impl LanguageModel for NoEchoModel {
        fn name(&self) -> &str {
            "no-echo"
        }

        fn context_limit(&self) -> u32 {
            1024
        }

        async fn tokenize(&self, text: &str) -> Result<Vec<u32>, LlmError> {
            Ok(encode(text))
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u32>, LlmError> {
            let mut out = request.prompt_tokens.clone();
            out.extend(encode("Fine."));
            Ok(out)
        }

        async fn detokenize(&self, tokens: &[u32]) -> Result<String, LlmError> {
            Ok(format!("# {}", decode(tokens)))
        }
    }

    fn config() -> RobotConfig {
        RobotConfig {
            seed: "You are Simon.".to_string(),
            query_formatter: "{0} - asked you.".to_string(),
            answer_cue: "\nYou answered:\n-".to_string(),
            ..RobotConfig::default()
        }
    }

    fn engine_with(model: impl LanguageModel + 'static, config: &RobotConfig) -> ConversationEngine {
        ConversationEngine::from_config(BoxLanguageModel::new(model), config)
            .unwrap()
            .with_seed(1)
    }

    #[tokio::test]
    async fn test_start_session_counts_seed_tokens() {
        let engine = engine_with(ScriptedModel::new(1024, ""), &config());
        let state = engine.start_session("TEST", "You are Simon.").await.unwrap();
        assert_eq!(state.seed().token_length(), 14);
        assert!(state.history().is_empty());
    }

    #[tokio::test]
    async fn test_answer_returns_sanitized_reply() {
        let cfg = RobotConfig {
            max_phrases: 1,
            ..config()
        };
        let mut engine = engine_with(
            ScriptedModel::new(1024, " I am Simon - сказал он - hello. And more text."),
            &cfg,
        );
        let mut state = engine.start_session("TEST", &cfg.seed).await.unwrap();

        let reply = engine.answer("Who are you?", &mut state).await.unwrap();
        assert_eq!(reply, "I am Simon  hello.");

        let texts: Vec<&str> = state.history().iter().map(Phrase::text).collect();
        assert_eq!(texts, vec!["Who are you? - asked you.", "I am Simon  hello."]);
        assert_eq!(state.history()[1].token_length(), 18);
    }

    #[tokio::test]
    async fn test_default_persona_strips_attribution() {
        let cfg = RobotConfig {
            max_phrases: 1,
            ..RobotConfig::default()
        };
        let mut engine = engine_with(
            ScriptedModel::new(4096, " Я Саймон - сказал он - привет. Что-то ещё."),
            &cfg,
        );
        let mut state = engine.start_session("TEST", &cfg.seed).await.unwrap();

        let reply = engine.answer("Кто вы?", &mut state).await.unwrap();
        assert_eq!(reply, "Я Саймон  привет.");
        assert_eq!(state.history()[0].text(), "Кто вы? - спросили вас.");
    }

    #[tokio::test]
    async fn test_each_turn_adds_two_phrases() {
        let mut engine = engine_with(ScriptedModel::new(100_000, " Yes. Sure. Ok."), &config());
        let mut state = engine.start_session("TEST", "You are Simon.").await.unwrap();
        for turn in 1..=4 {
            engine.answer("Really?", &mut state).await.unwrap();
            assert_eq!(state.history().len(), turn * 2);
        }
    }

    #[tokio::test]
    async fn test_request_allows_reply_tokens_on_top_of_prompt() {
        let cfg = RobotConfig {
            reply_token_allowance: 7,
            ..config()
        };
        let model = std::sync::Arc::new(ScriptedModel::new(1024, " Fine."));
        let mut engine = ConversationEngine::from_config(
            BoxLanguageModel::new(SharedModel(model.clone())),
            &cfg,
        )
        .unwrap();
        let mut state = engine.start_session("TEST", &cfg.seed).await.unwrap();
        engine.answer("Hi", &mut state).await.unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let prompt = "You are Simon.\n- Hi - asked you.\nYou answered:\n-";
        assert_eq!(requests[0].prompt_tokens, encode(prompt));
        assert_eq!(requests[0].max_length, prompt.chars().count() as u32 + 7);
        assert!(!requests[0].parameters.do_sample);
    }

    #[tokio::test]
    async fn test_context_limit_override_evicts_history() {
        let cfg = RobotConfig {
            context_limit: Some(60),
            ..config()
        };
        let mut engine = engine_with(ScriptedModel::new(100_000, " Ok."), &cfg);
        let mut state = engine.start_session("TEST", &cfg.seed).await.unwrap();

        engine.answer("First question", &mut state).await.unwrap();
        engine.answer("Second question", &mut state).await.unwrap();

        // seed 14 + "Second question - asked you." 28 = 42; adding the
        // previous reply "Ok." (3) is 45, the first query (27) would be 72.
        let texts: Vec<&str> = state.history().iter().map(Phrase::text).collect();
        assert_eq!(texts, vec!["Ok.", "Second question - asked you.", "Ok."]);
    }

    #[tokio::test]
    async fn test_saturated_window_keeps_answering() {
        let model = std::sync::Arc::new(ScriptedModel::new(60, " Ok."));
        let mut engine = ConversationEngine::from_config(
            BoxLanguageModel::new(SharedModel(model.clone())),
            &config(),
        )
        .unwrap()
        .with_seed(1);
        let mut state = engine.start_session("TEST", "You are Simon.").await.unwrap();

        for turn in 0..6 {
            let reply = engine.answer("Question", &mut state).await;
            assert_eq!(reply.unwrap(), "Ok.", "turn {turn}");
        }

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 6);
        assert!(requests.iter().all(|r| r.prompt_tokens.len() <= 60));
        // Every prompt still ends with the answer cue.
        let cue = encode("\nYou answered:\n-");
        assert!(requests.iter().all(|r| r.prompt_tokens.ends_with(&cue)));
    }

    #[test]
    fn test_truncate_front() {
        let mut tokens = vec![1, 2, 3, 4, 5];
        assert_eq!(truncate_front(&mut tokens, 3), 2);
        assert_eq!(tokens, vec![3, 4, 5]);
        assert_eq!(truncate_front(&mut tokens, 10), 0);
        assert_eq!(tokens, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let mut engine = engine_with(FailingModel, &config());
        let mut state = engine.start_session("TEST", "You are Simon.").await.unwrap();
        let err = engine.answer("Hello", &mut state).await.unwrap_err();
        assert!(matches!(
            err,
            ConversationError::Llm(LlmError::Overloaded(ref msg)) if msg == "device busy"
        ));
    }

    #[tokio::test]
    async fn test_falls_back_to_new_tokens_when_prompt_not_echoed() {
        let mut engine = engine_with(NoEchoModel, &config());
        let mut state = engine.start_session("TEST", "You are Simon.").await.unwrap();
        let reply = engine.answer("Hello", &mut state).await.unwrap();
        assert_eq!(reply, "# Fine.");
    }

    #[test]
    fn test_malformed_template_fails_at_construction() {
        let cfg = RobotConfig {
            query_formatter: "asked you.".to_string(),
            ..config()
        };
        let result = ConversationEngine::from_config(
            BoxLanguageModel::new(ScriptedModel::new(1024, "")),
            &cfg,
        );
        assert!(matches!(
            result,
            Err(ConversationError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn test_strip_prompt() {
        assert_eq!(
            strip_prompt("  seed\n-  Hello there. ", "seed\n-"),
            Some("Hello there.".to_string())
        );
        assert_eq!(strip_prompt("other text", "seed"), None);
    }

    /// Lets a test keep a handle on the model after boxing it.
    struct SharedModel(std::sync::Arc<ScriptedModel>);

    impl LanguageModel for SharedModel {
        fn name(&self) -> &str {
            self.0.name()
        }

        fn context_limit(&self) -> u32 {
            self.0.context_limit()
        }

        async fn tokenize(&self, text: &str) -> Result<Vec<u32>, LlmError> {
            self.0.tokenize(text).await
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u32>, LlmError> {
            self.0.generate(request).await
        }

        async fn detokenize(&self, tokens: &[u32]) -> Result<String, LlmError> {
            self.0.detokenize(tokens).await
        }
    }
}
