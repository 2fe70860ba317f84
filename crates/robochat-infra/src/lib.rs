//! Infrastructure layer for robochat.
//!
//! Contains the concrete [`LanguageModel`](robochat_core::llm::provider::LanguageModel)
//! backend (an HTTP client for a llama.cpp-compatible completion server) and
//! the TOML configuration loader.

pub mod config;
pub mod llm;
