//! Text post-processing shared by prompt building and reply cleanup.
//!
//! - `normalize`: collapse runs of repeated punctuation/whitespace
//! - `trim`: cut generated text down to a few whole sentences
//! - `sanitize`: sentence cutting plus narrative-tag removal

pub mod normalize;
pub mod sanitize;
pub mod trim;
