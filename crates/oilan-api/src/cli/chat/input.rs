//! Line input for the terminal chat.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// What the user did at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// A non-empty line to send as a turn.
    Turn(String),
    /// `/quit`, `/exit`, Ctrl+D or Ctrl+C.
    Quit,
    /// Blank line; nothing to send.
    Skip,
}

/// Classify one submitted line.
pub fn classify_line(line: &str) -> InputEvent {
    let trimmed = line.trim();
    match trimmed {
        "" => InputEvent::Skip,
        "/quit" | "/exit" => InputEvent::Quit,
        text => InputEvent::Turn(text.to_string()),
    }
}

/// Async prompt backed by `rustyline_async`.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Returns the prompt and a `SharedWriter` for printing above it.
    pub fn new(prompt: &str) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt.to_string())?;
        Ok((Self { rl }, writer))
    }

    pub async fn next_event(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let event = classify_line(&line);
                if let InputEvent::Turn(text) = &event {
                    self.rl.add_history_entry(text.clone());
                }
                event
            }
            Ok(ReadlineEvent::Eof | ReadlineEvent::Interrupted) | Err(_) => InputEvent::Quit,
        }
    }

    /// Restore the terminal before exiting.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}
