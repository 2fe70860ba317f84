//! Collapsing of repeated non-alphanumeric characters.
//!
//! Generated text (and sometimes user input) tends to stutter: `"!!!"`,
//! `"...."`, long runs of spaces or dashes. Letters and digits are allowed
//! to repeat (`"Jarrett"`, `"1988"`), everything else is squeezed to a
//! single character.

/// Characters that may legitimately repeat: ASCII letters and digits plus
/// the Cyrillic `а..я` / `А..Я` ranges.
pub fn is_repeatable(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('а'..='я').contains(&c) || ('А'..='Я').contains(&c)
}

/// Collapse every run of 2+ identical non-repeatable characters to one.
///
/// Works in passes until the whitespace-trimmed text stops changing and
/// returns the trimmed result. Each pass can only drop characters, so the
/// loop always terminates.
pub fn normalize(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = collapse_pass(&current);
        debug_assert!(next.len() <= current.len());
        if next.trim() == current.trim() {
            return next.trim().to_string();
        }
        current = next.trim().to_string();
    }
}

/// One left-to-right pass. A character is dropped when the character after
/// it is identical and it is not repeatable; a trailing space stands in for
/// the "next" character at the end of the string.
fn collapse_pass(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let next = chars.peek().copied().unwrap_or(' ');
        if is_repeatable(c) || c != next {
            out.push(c);
        }
    }
    out
}
