//! Shared domain types for robochat.
//!
//! This crate contains the data shapes every other crate agrees on:
//! phrases and conversation state, generation parameters, the model
//! collaborator's request/error types, and configuration.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod llm;
