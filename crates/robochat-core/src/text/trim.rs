//! Sentence cutting for generated continuations.
//!
//! A causal model keeps talking well past the end of a natural reply. The
//! trimmer keeps a small, randomly sized number of leading sentences and
//! throws the rest away.

use rand::Rng;

/// Sentence terminators, in the order they are checked.
const TERMINATORS: [char; 3] = ['!', '?', '.'];

/// Characters skipped at the start of a fragment.
const LEADING_FILLER: &[char] = &['!', '?', '.', ' ', '\n'];

/// Result of cutting one fragment off a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    /// The extracted sentence-like fragment, trimmed.
    pub fragment: String,
    /// The input with the first occurrence of `fragment` deleted.
    pub remainder: String,
}

/// Cut the first sentence-like fragment off `text`.
///
/// Leading terminators/whitespace and trailing whitespace are stripped, then
/// the text is re-truncated once per terminator in `!`, `?`, `.` order:
/// every terminator still present cuts the text right after its first
/// occurrence. After a whitespace trim the text is truncated one final time
/// at the first terminator (in the same order) it contains.
///
/// Text without any terminator comes back whole (trimmed).
pub fn cut_one(text: &str) -> Cut {
    let mut fragment = text.trim_start_matches(LEADING_FILLER).trim_end().to_string();
    for terminator in TERMINATORS {
        if let Some(idx) = fragment.find(terminator) {
            fragment.truncate(idx + terminator.len_utf8());
        }
    }

    let mut fragment = fragment.trim().to_string();
    let first_cut = TERMINATORS.iter().find_map(|terminator| {
        fragment
            .find(*terminator)
            .map(|idx| idx + terminator.len_utf8())
    });
    if let Some(end) = first_cut {
        fragment.truncate(end);
    }

    let remainder = if fragment.is_empty() {
        text.to_string()
    } else {
        text.replacen(&fragment, "", 1)
    };

    Cut {
        fragment,
        remainder,
    }
}

/// Draw how many fragments to keep: `round(1 + u * (max_count - 1))` with
/// `u` uniform in `[0, 1)`. The endpoints get half the weight of the
/// values in between.
pub fn draw_count<R: Rng + ?Sized>(max_count: u32, rng: &mut R) -> usize {
    let max = f64::from(max_count.max(1));
    let u: f64 = rng.gen_range(0.0..1.0);
    (1.0 + u * (max - 1.0)).round() as usize
}

/// Keep between 1 and `max_count` leading fragments of `text`, joined by a
/// single space in extraction order.
///
/// Each extracted fragment is deleted (first occurrence only) from the
/// working text before the next cut. Extraction stops early once the text
/// has no fragment left to give.
pub fn cut_many<R: Rng + ?Sized>(text: &str, max_count: u32, rng: &mut R) -> String {
    let count = draw_count(max_count, rng);
    let mut remaining = text.to_string();
    let mut fragments: Vec<String> = Vec::with_capacity(count);

    for _ in 0..count {
        let cut = cut_one(&remaining);
        if cut.fragment.is_empty() {
            break;
        }
        remaining = cut.remainder;
        fragments.push(cut.fragment);
    }

    fragments.join(" ")
}
