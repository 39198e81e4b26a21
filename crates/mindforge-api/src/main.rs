//! MindForge CLI and REST API entry point.
//!
//! Binary name: `mindforge`
//!
//! Parses CLI arguments, initializes logging, database and services, then
//! runs the chosen command or the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use mindforge_infra::config::resolve_data_dir;
use mindforge_observe::tracing_setup::{LogOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogOptions {
        verbosity: cli.verbose,
        format: cli.log_format.into(),
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let state = AppState::init(resolve_data_dir()).await?;

    let result = match cli.command {
        Commands::Serve { host, port } => serve(state, host, port).await,
        Commands::User {
            action: UserCommand::Create { name },
        } => cli::user::create_user(&state, &name).await,
        Commands::Providers { model } => {
            cli::provider::list_providers(&state, model.as_deref());
            Ok(())
        }
    };

    shutdown_tracing();
    result
}

async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, data_dir = %state.data_dir.display(), "MindForge API listening");

    let dispatcher = state.dispatcher.clone();
    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(in_flight = dispatcher.in_flight(), "draining background dispatches");
    dispatcher.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
