//! Query templates such as `"{0} - asked you."`.

use robochat_types::error::ConversationError;

/// A template with exactly one positional slot (`{0}` or `{}`).
///
/// `{{` and `}}` stand for literal braces. Any other brace usage, named
/// slots, or a slot count other than one is rejected when the template is
/// parsed, so formatting itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFormatter {
    before: String,
    after: String,
}

impl QueryFormatter {
    pub fn new(template: &str) -> Result<Self, ConversationError> {
        let malformed = |reason: &str| ConversationError::MalformedTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut before = String::new();
        let mut after = String::new();
        let mut slots = 0;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if slots == 0 { &mut before } else { &mut after };
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => field.push(ch),
                            None => return Err(malformed("unclosed '{'")),
                        }
                    }
                    if !field.is_empty() && field != "0" {
                        return Err(malformed(&format!("unsupported slot '{{{field}}}'")));
                    }
                    slots += 1;
                    if slots > 1 {
                        return Err(malformed("more than one substitution slot"));
                    }
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => return Err(malformed("single '}' outside a slot")),
                other => out.push(other),
            }
        }

        if slots == 0 {
            return Err(malformed("no substitution slot"));
        }

        Ok(Self {
            before,
            after,
        })
    }

    /// Substitute `phrase` into the slot.
    pub fn format(&self, phrase: &str) -> String {
        let mut out = String::with_capacity(self.before.len() + phrase.len() + self.after.len());
        out.push_str(&self.before);
        out.push_str(phrase);
        out.push_str(&self.after);
        out
    }
}
