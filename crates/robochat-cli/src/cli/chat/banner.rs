//! Welcome banner display for chat sessions.

use console::style;

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(name: &str, model: &str, context_limit: u32, seed_tokens: u32) {
    println!();
    println!("  {} {}", style("*").cyan().bold(), style(name).cyan().bold());
    println!();
    println!("  {}    {}", style("Model:").bold(), style(model).dim());
    println!(
        "  {}  {}",
        style("Context:").bold(),
        style(format!("{context_limit} tokens ({seed_tokens} used by persona)")).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, an empty line or Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
