//! Conversation logic for robochat.
//!
//! This crate defines the "port" for the language model (`LanguageModel`)
//! that the infrastructure layer implements, plus everything that happens
//! around a model call: text normalization, context windowing, prompt
//! construction and reply sanitizing. It depends only on `robochat-types`
//! -- never on `robochat-infra` or any HTTP crate.

pub mod context;
pub mod engine;
pub mod llm;
pub mod text;
