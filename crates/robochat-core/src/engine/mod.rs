//! Conversation engine for robochat.
//!
//! `ConversationEngine` runs one dialogue turn end to end: query templating,
//! context admission, the model call, and reply sanitizing.

pub mod conversation;
pub mod template;
