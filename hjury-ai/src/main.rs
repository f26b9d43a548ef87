//! hjury-ai - AI Jury microservice
//!
//! Runs the four-layer candidate elimination tournament over a hackathon's
//! projects and serves sessions, progress and results over HTTP + SSE.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hjury_ai::services::GithubClient;
use hjury_ai::AppState;
use hjury_common::config::{self as common_config, DEFAULT_BIND_ADDRESS};
use hjury_common::events::EventBus;

/// Command-line arguments for hjury-ai
#[derive(Parser, Debug)]
#[command(name = "hjury-ai")]
#[command(about = "AI Jury microservice for hackathon judging")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "HJURY_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(short, long, env = "HJURY_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "HJURY_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => common_config::default_config_path("hjury-ai")?,
    };
    let toml_config = common_config::load_toml_config(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hjury-ai (AI Jury) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    let root_folder = common_config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = root_folder.join(hjury_ai::db::DATABASE_FILE);
    info!("Database: {}", db_path.display());

    let db_pool = hjury_ai::db::init_database_pool(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let tuning = toml_config.jury.clone();
    let github_token = hjury_ai::config::resolve_github_token(&db_pool, &toml_config).await?;
    let github = GithubClient::new(github_token, tuning.github_requests_per_second)
        .context("Failed to create GitHub client")?;

    let event_bus = EventBus::new(256);
    let state = AppState::new(db_pool, event_bus, Arc::new(github), tuning);
    let app = hjury_ai::build_router(state);

    let bind = args
        .bind
        .or_else(|| toml_config.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
