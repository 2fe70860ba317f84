//! robochat entry point.
//!
//! Binary name: `robochat`
//!
//! Parses CLI arguments, sets up tracing, loads the configuration, then
//! dispatches to the requested command.

mod cli;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use robochat_infra::config::{default_config_path, load_config, load_config_strict};
use robochat_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use robochat_types::config::RobotConfig;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        otel: cli.otel,
        json: cli.json_logs,
        default_filter: TracingOptions::filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need configuration
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "robochat", &mut std::io::stdout());
        return Ok(());
    }

    let config = resolve_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Chat { name, rng_seed } => {
            cli::chat::loop_runner::run_chat_loop(&config, name, rng_seed).await?;
        }
        Commands::Config => {
            cli::config::show_config(&config)?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// An explicitly named config file must load cleanly; the default location
/// falls back to built-in defaults.
async fn resolve_config(explicit: Option<&std::path::Path>) -> anyhow::Result<RobotConfig> {
    match explicit {
        Some(path) => load_config_strict(path)
            .await
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(load_config(&default_config_path()).await?),
    }
}
