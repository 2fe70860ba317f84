//! Language model abstractions for robochat.
//!
//! - `LanguageModel`: RPITIT trait for concrete model backends
//! - `BoxLanguageModel`: object-safe wrapper for dynamic dispatch

pub mod box_provider;
pub mod provider;
