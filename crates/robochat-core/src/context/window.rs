//! Token-budgeted history window and prompt rendering.

use tracing::debug;

use robochat_types::conversation::{ConversationState, Phrase};

use crate::text::normalize::normalize;

/// Cue appended after the dialogue so the model answers in character.
pub const DEFAULT_ANSWER_CUE: &str = "\nВы ответили:\n-";

/// Keeps the seed plus as much recent history as fits under the model's
/// context limit, and renders it as a prompt.
///
/// Eviction is strictly oldest-first: history is walked from the newest
/// phrase backwards, and the first phrase that would bring the running
/// total (seed included) to the limit or beyond is dropped together with
/// everything older than it.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    context_limit: u32,
    answer_cue: String,
}

impl ContextWindow {
    pub fn new(context_limit: u32) -> Self {
        Self {
            context_limit,
            answer_cue: DEFAULT_ANSWER_CUE.to_string(),
        }
    }

    /// Replace the cue appended after the dialogue.
    pub fn with_answer_cue(mut self, cue: impl Into<String>) -> Self {
        self.answer_cue = cue.into();
        self
    }

    pub fn context_limit(&self) -> u32 {
        self.context_limit
    }

    /// Append `query` to the history, evict what no longer fits, and return
    /// the prompt for the surviving dialogue.
    pub fn admit(&self, query: Phrase, state: &mut ConversationState) -> String {
        state.push(query);

        let before = state.history().len();
        let keep = self.fitting_suffix_len(state);
        state.retain_recent(keep);

        debug!(
            retained = keep,
            evicted = before - keep,
            seed_tokens = state.seed().token_length(),
            window_tokens = state.total_tokens(),
            context_limit = self.context_limit,
            "admitted query into context window"
        );

        self.render(state)
    }

    /// How many of the most recent history phrases fit next to the seed.
    pub fn fitting_suffix_len(&self, state: &ConversationState) -> usize {
        let limit = u64::from(self.context_limit);
        let mut total = u64::from(state.seed().token_length());
        let mut keep = 0;

        for phrase in state.history().iter().rev() {
            total += u64::from(phrase.token_length());
            if total >= limit {
                break;
            }
            keep += 1;
        }

        keep
    }

    /// Seed, then one `- `-prefixed line per history phrase, normalized,
    /// followed by the answer cue.
    pub fn render(&self, state: &ConversationState) -> String {
        let mut lines = Vec::with_capacity(state.history().len() + 1);
        lines.push(state.seed().text().to_string());
        lines.extend(state.history().iter().map(|p| format!("- {}", p.text())));

        let mut prompt = normalize(&format!("{} ", lines.join("\n")));
        prompt.push_str(&self.answer_cue);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(seed_len: u32, lengths: &[u32]) -> ConversationState {
        let mut state = ConversationState::new("TEST", Phrase::new("You are Simon.", seed_len));
        for (i, len) in lengths.iter().enumerate() {
            state.push(Phrase::new(format!("line {i}"), *len));
        }
        state
    }

    fn texts(state: &ConversationState) -> Vec<&str> {
        state.history().iter().map(Phrase::text).collect()
    }

    #[test]
    fn test_everything_fits() {
        let window = ContextWindow::new(1000);
        let mut state = state(50, &[20, 20]);
        window.admit(Phrase::new("query", 30), &mut state);
        assert_eq!(texts(&state), vec!["line 0", "line 1", "query"]);
    }

    #[test]
    fn test_budget_scenario_keeps_only_newest() {
        // 50 + 30 = 80 fits, 80 + 20 = 100 is not below the limit.
        let window = ContextWindow::new(100);
        let mut state = state(50, &[20, 20, 20]);
        window.admit(Phrase::new("query", 30), &mut state);
        assert_eq!(texts(&state), vec!["query"]);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let window = ContextWindow::new(100);
        let mut state = state(10, &[40, 10, 10]);
        window.admit(Phrase::new("query", 10), &mut state);
        // 10 + 10 + 10 + 10 = 40, + 40 = 80 < 100: all fit.
        assert_eq!(state.history().len(), 4);

        window.admit(Phrase::new("next", 25), &mut state);
        // 10 + 25 + 10 + 10 + 10 = 65, + 40 = 105: the 40 goes.
        assert_eq!(texts(&state), vec!["line 1", "line 2", "query", "next"]);
    }

    #[test]
    fn test_seed_over_limit_keeps_no_history() {
        let window = ContextWindow::new(100);
        let mut state = state(120, &[5, 5]);
        let prompt = window.admit(Phrase::new("query", 5), &mut state);
        assert!(state.history().is_empty());
        assert_eq!(prompt, "You are Simon.\nВы ответили:\n-");
    }

    #[test]
    fn test_query_alone_too_big_is_dropped() {
        let window = ContextWindow::new(100);
        let mut state = state(50, &[]);
        window.admit(Phrase::new("huge", 60), &mut state);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_window_never_reaches_limit() {
        let window = ContextWindow::new(64);
        let mut state = state(16, &[]);
        for i in 0..50u32 {
            window.admit(Phrase::new(format!("q{i}"), 1 + i % 9), &mut state);
            assert!(state.total_tokens() < 64 || state.history().is_empty());
            state.push(Phrase::new(format!("r{i}"), 1 + (i * 7) % 11));
        }
    }

    #[test]
    fn test_render_format() {
        let window = ContextWindow::new(1000);
        let mut state = state(5, &[]);
        let prompt = window.admit(Phrase::new("Hi - asked you.", 5), &mut state);
        assert_eq!(prompt, "You are Simon.\n- Hi - asked you.\nВы ответили:\n-");
    }

    #[test]
    fn test_render_normalizes_dialogue_but_not_cue() {
        let window = ContextWindow::new(1000).with_answer_cue("\nYou answered:\n-");
        let mut state = state(5, &[]);
        state.push(Phrase::new("Hello!!!   Anyone??", 4));
        let prompt = window.render(&state);
        assert_eq!(prompt, "You are Simon.\n- Hello! Anyone?\nYou answered:\n-");
    }
}
