//! Oilan CLI and dialog server entry point.
//!
//! Binary name: `oilan`
//!
//! Parses CLI arguments, loads configuration, initializes the database and
//! generation backend, then dispatches to a command or starts the server.

mod cli;
mod http;
mod state;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, DialogCommand};
use oilan_infra::config::{load_config, load_config_from, resolve_data_dir};
use oilan_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use oilan_types::config::OilanConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "oilan", &mut std::io::stdout());
        return Ok(());
    }

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    if let Commands::Serve { log_json, otel, .. } = &cli.command {
        // A server with no -v still reports requests.
        if cli.verbose == 0 && !cli.quiet {
            tracing_options.default_filter = "info".to_string();
        }
        tracing_options.json = *log_json;
        tracing_options.otel = *otel;
    }
    if let Err(e) = init_tracing(&tracing_options) {
        eprintln!("failed to initialize tracing: {e}");
    }

    let data_dir = resolve_data_dir();
    let mut config = match &cli.config {
        Some(path) => load_config_from(path).await,
        None => load_config(&data_dir).await,
    };
    if let Commands::Serve {
        host,
        port,
        backend,
        ..
    } = &cli.command
    {
        apply_serve_overrides(&mut config, host.clone(), *port, *backend);
    }

    let result = run(cli, config, data_dir).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, config: OilanConfig, data_dir: PathBuf) -> anyhow::Result<()> {
    let state = AppState::init(config, data_dir).await?;

    match cli.command {
        Commands::Serve { .. } => serve(&state).await?,

        Commands::Dialogs { action } => match action {
            DialogCommand::List { user, .. } => {
                cli::dialog::list_dialogs(&state, user, cli.json).await?;
            }
            DialogCommand::Show { id, user, .. } => {
                cli::dialog::show_dialog(&state, id, user, cli.json).await?;
            }
        },

        Commands::Chat {
            user,
            dialog,
            title,
        } => {
            cli::chat::run_chat(&state, user, dialog, title).await?;
        }

        Commands::Completions { .. } => unreachable!("handled before state init"),
    }

    state.db_pool.close().await;
    Ok(())
}

fn apply_serve_overrides(
    config: &mut OilanConfig,
    host: Option<String>,
    port: Option<u16>,
    backend: Option<oilan_types::config::BackendKind>,
) {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(backend) = backend {
        config.backend.kind = backend;
    }
}

async fn serve(state: &AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Oilan listening on {} ({} backend)",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan(),
        console::style(state.config.backend.kind).yellow()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    serve_until(listener, state, shutdown_signal()).await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Serve the router on `listener` until `shutdown` resolves.
///
/// The caller keeps `state` and closes its pool afterwards.
async fn serve_until(
    listener: tokio::net::TcpListener,
    state: &AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = http::router::build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
