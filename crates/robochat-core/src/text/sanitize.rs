//! Reply cleanup: sentence cutting plus narrative-tag stripping.
//!
//! Models trained on fiction like to attribute their own lines
//! (`"I'm fine - said he - really."`). The sanitizer removes those
//! dash-bracketed clauses when they start with one of the configured verb
//! stems.

use rand::Rng;
use regex::Regex;
use tracing::debug;

use robochat_types::error::ConversationError;

use super::trim::cut_many;

/// Turns a raw model continuation into the reply shown to the user.
#[derive(Debug, Clone)]
pub struct OutputSanitizer {
    max_phrases: u32,
    narrative_tag: Option<Regex>,
}

impl OutputSanitizer {
    /// Build a sanitizer keeping up to `max_phrases` sentences and stripping
    /// clauses of the form `- <stem>... -` for any of `stems`.
    ///
    /// Stems are matched literally. An empty stem list disables stripping.
    pub fn new<S: AsRef<str>>(stems: &[S], max_phrases: u32) -> Result<Self, ConversationError> {
        let narrative_tag = if stems.is_empty() {
            None
        } else {
            Some(narrative_tag_pattern(stems)?)
        };

        Ok(Self {
            max_phrases,
            narrative_tag,
        })
    }

    /// Keep a random number of leading sentences, then drop every
    /// narrative-tag clause from them.
    pub fn sanitize<R: Rng + ?Sized>(&self, raw: &str, rng: &mut R) -> String {
        let cut = cut_many(raw, self.max_phrases, rng);
        let cleaned = match &self.narrative_tag {
            Some(pattern) => pattern.replace_all(&cut, "").into_owned(),
            None => cut,
        };
        debug!(raw_len = raw.len(), reply_len = cleaned.len(), "sanitized continuation");
        cleaned
    }
}

/// `-`, optional whitespace, one of the stems, anything (greedy, same
/// line), `-`.
fn narrative_tag_pattern<S: AsRef<str>>(stems: &[S]) -> Result<Regex, ConversationError> {
    let alternatives = stems
        .iter()
        .map(|stem| regex::escape(stem.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"-\s*(?:{alternatives}).*-"))
        .map_err(|e| ConversationError::InvalidStemPattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn russian() -> OutputSanitizer {
        OutputSanitizer::new(&["говор", "сказ", "спрос", "воскл"], 3).unwrap()
    }

    #[test]
    fn test_strips_attribution_clause() {
        let mut rng = StepRng::new(0, 0);
        let reply = russian().sanitize("Я не помню - сказал он - правда.", &mut rng);
        assert_eq!(reply, "Я не помню  правда.");
        assert!(!reply.contains("сказал"));
    }

    #[test]
    fn test_strips_clause_across_joined_fragments() {
        let mut rng = StepRng::new(u64::MAX, 0);
        let reply = russian().sanitize("Привет - спросил он - ты кто? Не знаю. Всё.", &mut rng);
        assert_eq!(reply, "Привет  ты кто? Не знаю. Всё.");
    }

    #[test]
    fn test_leaves_plain_dashes_alone() {
        let mut rng = StepRng::new(0, 0);
        let reply = russian().sanitize("Toronto - a big city - is far.", &mut rng);
        assert_eq!(reply, "Toronto - a big city - is far.");
    }

    #[test]
    fn test_greedy_match_runs_to_last_dash() {
        let mut rng = StepRng::new(0, 0);
        let reply = russian().sanitize("Да - говорю - я - сказал он - тут.", &mut rng);
        assert_eq!(reply, "Да  тут.");
    }

    #[test]
    fn test_stems_are_configurable() {
        let sanitizer = OutputSanitizer::new(&["said", "asked"], 1).unwrap();
        let mut rng = StepRng::new(u64::MAX, 0);
        let reply = sanitizer.sanitize("I'm fine - said he - really. Bye.", &mut rng);
        assert_eq!(reply, "I'm fine  really.");
    }

    #[test]
    fn test_stems_are_escaped() {
        let sanitizer = OutputSanitizer::new(&["a+c"], 1).unwrap();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(sanitizer.sanitize("x - aac - y", &mut rng), "x - aac - y");
        assert_eq!(sanitizer.sanitize("x - a+c - y", &mut rng), "x  y");
    }

    #[test]
    fn test_no_stems_disables_stripping() {
        let sanitizer = OutputSanitizer::new::<&str>(&[], 1).unwrap();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(
            sanitizer.sanitize("Да - сказал он - тут.", &mut rng),
            "Да - сказал он - тут."
        );
    }
}
