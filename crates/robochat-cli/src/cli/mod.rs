//! CLI command definitions for the `robochat` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with a persona running on a local language model.
#[derive(Parser)]
#[command(name = "robochat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (default: platform config dir).
    #[arg(long, global = true, env = "ROBOCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug logs, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Write log lines as JSON.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive conversation.
    Chat {
        /// Session name shown in the banner and logs (default: from config).
        #[arg(long)]
        name: Option<String>,

        /// Seed for the reply-length random source, for reproducible replies.
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Print the effective configuration as TOML.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
