//! Dialog inspection commands.
//!
//! `oilan dialogs list` and `oilan dialogs show` read straight from the store
//! through the orchestrator. Both are owner-scoped like the HTTP API unless
//! `--all` asks for the operator view.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use oilan_types::dialog::{Dialog, DialogSummary, Role};
use oilan_types::ids::{DialogId, UserId};

use crate::state::AppState;

/// List dialogs for one user, or every dialog when `user` is `None`.
///
/// # Examples
///
/// ```bash
/// oilan dialogs list --user 7
/// oilan dialogs list --all --json
/// ```
pub async fn list_dialogs(state: &AppState, user: Option<UserId>, json: bool) -> Result<()> {
    let dialogs = match user {
        Some(user_id) => state.orchestrator.list_dialogs(user_id).await?,
        None => state.orchestrator.list_all_dialogs().await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&dialogs)?);
        return Ok(());
    }

    if dialogs.is_empty() {
        println!();
        println!(
            "  {} No dialogs found. Start one with: {}",
            style("i").blue().bold(),
            style("oilan chat --user <id>").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", render_table(&dialogs));
    println!();
    println!(
        "  {} dialog{}",
        style(dialogs.len()).bold(),
        if dialogs.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn render_table(dialogs: &[DialogSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Owner").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
    ]);

    for dialog in dialogs {
        table.add_row(vec![
            Cell::new(dialog.id).fg(Color::DarkGrey),
            Cell::new(truncate_title(&dialog.title, 40)).fg(Color::Cyan),
            Cell::new(dialog.owner_id).fg(Color::White),
            Cell::new(dialog.created_at.format("%Y-%m-%d %H:%M")).fg(Color::White),
            Cell::new(dialog.updated_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Shorten a title to at most `max` characters, ending in `...` when cut.
fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let kept: String = title.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Print one dialog's transcript.
///
/// With `user` set only the owner may read it; `None` is the operator view.
pub async fn show_dialog(
    state: &AppState,
    id: DialogId,
    user: Option<UserId>,
    json: bool,
) -> Result<()> {
    let dialog = match user {
        Some(user_id) => state.orchestrator.dialog_for(id, user_id).await,
        None => state.orchestrator.inspect_dialog(id).await,
    }
    .with_context(|| format!("Cannot show dialog {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dialog)?);
        return Ok(());
    }

    print!("{}", render_transcript(&dialog));
    Ok(())
}

fn render_transcript(dialog: &Dialog) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "  {} {}\n",
        style(&dialog.title).cyan().bold(),
        style(format!("(#{}, user {})", dialog.id, dialog.owner_id)).dim()
    ));
    out.push('\n');

    if dialog.messages.is_empty() {
        out.push_str(&format!("  {}\n\n", style("No messages yet.").dim()));
        return out;
    }

    for message in &dialog.messages {
        let speaker = match message.role {
            Role::User => style("you").green().bold(),
            Role::Assistant => style("assistant").magenta().bold(),
        };
        out.push_str(&format!(
            "  {} {}\n",
            speaker,
            style(message.created_at.format("%H:%M:%S")).dim()
        ));
        for line in message.content.lines() {
            out.push_str(&format!("    {line}\n"));
        }
        out.push('\n');
    }

    out
}
