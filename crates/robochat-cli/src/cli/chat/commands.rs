//! Slash command parsing and execution for the chat loop.
//!
//! Commands start with `/`; anything else is a phrase for the robot.

use console::style;

use robochat_types::conversation::ConversationState;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Exit the chat session.
    Exit,
    /// Show the history currently inside the context window.
    History,
    /// Forget the history, keep the persona.
    Reset,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/history" => Some(ChatCommand::History),
        "/reset" => Some(ChatCommand::Reset),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}     {}", style("/help").cyan(), "Show this help message");
    println!("  {}     {}", style("/exit").cyan(), "End the chat session");
    println!("  {}  {}", style("/history").cyan(), "Show the remembered dialogue");
    println!("  {}    {}", style("/reset").cyan(), "Forget the dialogue, keep the persona");
    println!();
    println!(
        "  {}",
        style("Empty line or Ctrl+D to exit, Ctrl+C is safe").dim()
    );
    println!();
}

/// Render the retained history, one phrase per line with its token count.
pub fn format_history(state: &ConversationState) -> Vec<String> {
    state
        .history()
        .iter()
        .map(|phrase| format!("[{:>4}] - {}", phrase.token_length(), phrase.text()))
        .collect()
}

/// Print the retained history and the token total of the window.
pub fn print_history(state: &ConversationState) {
    println!();
    let lines = format_history(state);
    if lines.is_empty() {
        println!("  {}", style("No dialogue yet.").dim());
    }
    for line in lines {
        println!("  {line}");
    }
    println!(
        "  {}",
        style(format!("{} tokens incl. persona", state.total_tokens())).dim()
    );
    println!();
}
