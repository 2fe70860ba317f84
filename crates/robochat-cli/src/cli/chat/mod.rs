//! Interactive chat for robochat.
//!
//! Implements the read-answer loop: welcome banner, thinking spinner,
//! slash commands and session teardown. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
