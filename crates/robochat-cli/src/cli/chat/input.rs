//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` and folds its events into what the
//! loop acts on: a line, end of input, or an interrupt.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a non-empty line.
    Message(String),
    /// End of input: Ctrl+D or an empty line.
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

impl InputEvent {
    /// Classify a submitted line. An empty (or all-whitespace) line ends the
    /// conversation.
    pub fn from_line(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            InputEvent::Eof
        } else {
            InputEvent::Message(trimmed.to_string())
        }
    }
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create a new input handler with the given prompt.
    ///
    /// Also returns a `SharedWriter` for output that must not clobber the
    /// prompt line.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    /// Read a line of input.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let event = InputEvent::from_line(&line);
                if let InputEvent::Message(text) = &event {
                    self.rl.add_history_entry(text.clone());
                }
                event
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(err) => {
                tracing::debug!(error = %err, "readline failed, ending input");
                InputEvent::Eof
            }
        }
    }

    /// Restore the terminal before the process writes its final lines.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}
