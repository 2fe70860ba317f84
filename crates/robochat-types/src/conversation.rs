//! Conversation state: the seed persona plus the rolling phrase history.

/// A piece of dialogue text paired with its token count.
///
/// The token count is whatever the model's tokenizer reported for exactly
/// this text. Fields are private so the pair cannot drift apart after
/// construction; build a new `Phrase` when the text changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    text: String,
    token_length: u32,
}

impl Phrase {
    pub fn new(text: impl Into<String>, token_length: u32) -> Self {
        Self {
            text: text.into(),
            token_length,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token_length(&self) -> u32 {
        self.token_length
    }
}

/// State of one conversation session.
///
/// `seed` is fixed for the lifetime of the session. `history` holds past
/// queries and replies in the order they happened; it only ever grows at
/// the end and only ever shrinks from the front (see
/// [`ConversationState::retain_recent`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    name: String,
    seed: Phrase,
    history: Vec<Phrase>,
}

impl ConversationState {
    /// Start a session with an empty history.
    pub fn new(name: impl Into<String>, seed: Phrase) -> Self {
        Self {
            name: name.into(),
            seed,
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed(&self) -> &Phrase {
        &self.seed
    }

    pub fn history(&self) -> &[Phrase] {
        &self.history
    }

    /// Append a phrase as the most recent history entry.
    pub fn push(&mut self, phrase: Phrase) {
        self.history.push(phrase);
    }

    /// Keep only the `count` most recent history entries, in order.
    pub fn retain_recent(&mut self, count: usize) {
        let evicted = self.history.len().saturating_sub(count);
        self.history.drain(..evicted);
    }

    /// Forget the whole history. The seed stays.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Token count of the seed plus every history entry.
    pub fn total_tokens(&self) -> u64 {
        u64::from(self.seed.token_length)
            + self
                .history
                .iter()
                .map(|p| u64::from(p.token_length))
                .sum::<u64>()
    }
}
