//! Terminal chat against the configured backend.
//!
//! Drives the same `ChatOrchestrator::post_turn` path as the HTTP and
//! WebSocket surfaces, so every turn is persisted and visible to the API.

pub mod input;

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline_async::SharedWriter;

use oilan_types::dialog::Role;
use oilan_types::error::ChatError;
use oilan_types::ids::{DialogId, UserId};

use crate::state::AppState;
use input::{ChatInput, InputEvent};

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run an interactive chat as `user`, resuming `dialog` if given.
pub async fn run_chat(
    state: &AppState,
    user: UserId,
    dialog: Option<DialogId>,
    title: Option<String>,
) -> Result<()> {
    let orchestrator = &state.orchestrator;

    let dialog = match dialog {
        Some(id) => orchestrator.dialog_for(id, user).await?,
        None => {
            orchestrator
                .start_dialog(user, title.as_deref().unwrap_or_default())
                .await?
        }
    };

    let (mut input, mut out) = ChatInput::new("you> ")?;

    writeln!(
        out,
        "\n  {} {}  {}\n",
        style(&dialog.title).cyan().bold(),
        style(format!("#{}", dialog.id)).dim(),
        style("/quit to leave").dim()
    )?;
    for message in &dialog.messages {
        print_message(&mut out, message.role, &message.content)?;
    }

    loop {
        let text = match input.next_event().await {
            InputEvent::Turn(text) => text,
            InputEvent::Skip => continue,
            InputEvent::Quit => break,
        };

        let spinner = thinking_spinner();
        let result = orchestrator.post_turn(dialog.id, user, &text).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => print_message(&mut out, reply.role, &reply.content)?,
            Err(ChatError::Generation(err)) => {
                tracing::warn!(dialog_id = %dialog.id, error = %err, "Generation failed");
                writeln!(
                    out,
                    "  {} {}\n",
                    style("!").red().bold(),
                    style(&state.channel.apology).red()
                )?;
            }
            Err(err) => {
                input.flush();
                return Err(err.into());
            }
        }
    }

    input.flush();
    writeln!(
        out,
        "\n  {} Dialog {} saved.",
        style("i").blue().bold(),
        style(dialog.id).cyan()
    )?;

    Ok(())
}

fn print_message(out: &mut SharedWriter, role: Role, content: &str) -> std::io::Result<()> {
    let label = match role {
        Role::User => style("you").green().bold(),
        Role::Assistant => style("assistant").magenta().bold(),
    };
    writeln!(out, "  {label}")?;
    for line in content.lines() {
        writeln!(out, "    {line}")?;
    }
    writeln!(out)
}
