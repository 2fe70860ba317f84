//! Main chat loop orchestration.
//!
//! Connects to the model server, opens a session with the configured
//! persona, then alternates between reading a phrase and printing the
//! robot's reply until the user leaves.

use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use robochat_core::engine::conversation::ConversationEngine;
use robochat_infra::llm::create_model;
use robochat_types::config::RobotConfig;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop.
///
/// `name` overrides the configured session name; `rng_seed` makes the
/// reply-length draws reproducible.
pub async fn run_chat_loop(
    config: &RobotConfig,
    name: Option<String>,
    rng_seed: Option<u64>,
) -> anyhow::Result<()> {
    let connecting = thinking_spinner();
    connecting.set_message("connecting to model server...");
    let model = create_model(&config.provider, config.context_limit).await;
    connecting.finish_and_clear();
    let model = model.map_err(|e| {
        anyhow::anyhow!(
            "cannot reach the model server at {}: {e}",
            config.provider.base_url
        )
    })?;

    let mut engine = ConversationEngine::from_config(model, config)?;
    if let Some(seed) = rng_seed {
        engine = engine.with_seed(seed);
    }

    let name = name.unwrap_or_else(|| config.name.clone());
    let mut state = engine.start_session(&name, &config.seed).await?;
    info!(session = %name, seed_tokens = state.seed().token_length(), "session started");

    print_welcome_banner(
        &name,
        engine.model_name(),
        engine.window().context_limit(),
        state.seed().token_length(),
    );

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let mut turns: u32 = 0;
    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D or send an empty line to exit.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Exit => break,
                ChatCommand::History => commands::print_history(&state),
                ChatCommand::Reset => {
                    state.clear_history();
                    println!("\n  {}\n", style("Dialogue forgotten.").dim());
                }
                ChatCommand::Unknown(cmd_name) => println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(cmd_name).dim()
                ),
            }
            continue;
        }

        // A failed turn must not leave a dangling query in the history.
        let snapshot = state.clone();
        let spinner = thinking_spinner();
        let start_time = Instant::now();
        let result = engine.answer(&text, &mut state).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => {
                turns += 1;
                info!(
                    turn = turns,
                    response_ms = start_time.elapsed().as_millis() as u64,
                    "reply ready"
                );
                println!("\n  {} {}\n", style(&name).cyan().bold(), reply);
            }
            Err(e) => {
                warn!(error = %e, "turn failed");
                state = snapshot;
                eprintln!("\n  {} Model error: {e}", style("!").red().bold());
                eprintln!("  {}\n", style("Type a message to retry, /exit to quit.").dim());
            }
        }
    }

    chat_input.flush();
    println!("\n  {}", style("Session ended.").dim());
    info!(session = %name, turns, "session ended");
    Ok(())
}
