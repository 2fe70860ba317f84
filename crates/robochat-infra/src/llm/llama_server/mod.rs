//! llama.cpp server backend.
//!
//! This module provides the [`LlamaServerProvider`] which implements the
//! [`LanguageModel`](robochat_core::llm::provider::LanguageModel) trait over
//! the server's `/tokenize`, `/completion` and `/detokenize` endpoints.

pub mod client;
pub mod types;

pub use client::LlamaServerProvider;
