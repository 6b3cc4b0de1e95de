//! CLI command definitions for the `oilan` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod dialog;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use oilan_types::config::BackendKind;
use oilan_types::ids::{DialogId, UserId};

/// Run and inspect the Oilan dialog server.
#[derive(Parser)]
#[command(name = "oilan", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: <data dir>/config.toml).
    #[arg(long, global = true, env = "OILAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP and WebSocket server.
    Serve {
        /// Interface to bind (overrides config).
        #[arg(long, env = "OILAN_HOST")]
        host: Option<String>,

        /// Port to listen on (overrides config).
        #[arg(short, long, env = "OILAN_PORT")]
        port: Option<u16>,

        /// Generation backend: mock, openai, gemini (overrides config).
        #[arg(long, env = "OILAN_BACKEND")]
        backend: Option<BackendKind>,

        /// Emit JSON log lines.
        #[arg(long)]
        log_json: bool,

        /// Export spans to stdout via OpenTelemetry.
        #[arg(long)]
        otel: bool,
    },

    /// Inspect stored dialogs.
    #[command(alias = "dialog")]
    Dialogs {
        #[command(subcommand)]
        action: DialogCommand,
    },

    /// Chat in the terminal as a given user.
    Chat {
        /// User id to act as.
        #[arg(long)]
        user: UserId,

        /// Continue an existing dialog instead of starting a new one.
        #[arg(long)]
        dialog: Option<DialogId>,

        /// Title for a new dialog.
        #[arg(long)]
        title: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum DialogCommand {
    /// List dialogs, most recently active first.
    #[command(alias = "ls")]
    List {
        /// Only dialogs owned by this user.
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        user: Option<UserId>,

        /// Every dialog across users.
        #[arg(long)]
        all: bool,
    },

    /// Print a dialog transcript.
    Show {
        /// Dialog id.
        id: DialogId,

        /// Owner of the dialog.
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        user: Option<UserId>,

        /// Open any dialog regardless of owner (operator view).
        #[arg(long)]
        all: bool,
    },
}
