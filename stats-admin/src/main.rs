//! stats-admin - administration web service for harvesting sources
//!
//! Runs the admin UI and REST API over the source/country tables, or with
//! `create-admin`, `enable-user` and `disable-user` manages accounts and exits.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stats_admin::{build_router, db::users, AppState};
use stats_common::config::{resolve_database_url, resolve_port};
use stats_common::db::init::init_database;
use stats_common::mask_db_uri;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for stats-admin
#[derive(Parser, Debug)]
#[command(name = "stats-admin")]
#[command(about = "Administration service for harvesting sources and countries")]
#[command(version)]
struct Args {
    /// Database connection URL (overrides DATABASE_URL and the config file)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Port to listen on (overrides PORT and FLASK_RUN_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create an active administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long, env = "STATS_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Re-enable a disabled account
    EnableUser {
        #[arg(long)]
        username: String,
    },
    /// Disable an account; its sessions stop authenticating
    DisableUser {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stats_admin=debug".into()),
        )
        .init();

    info!(
        "Starting stats-admin v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let database_url = resolve_database_url(args.database_url.as_deref());
    info!("Database: {}", mask_db_uri(&database_url));

    let pool = init_database(&database_url)
        .await
        .context("Failed to open database")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::CreateAdmin { username, password } => {
            let id = users::create_user(&pool, username.trim(), &password)
                .await
                .with_context(|| format!("Failed to create user '{}'", username))?;
            info!("Created administrator '{}' (id {})", username.trim(), id);
            Ok(())
        }
        Command::EnableUser { username } => set_user_active(&pool, &username, true).await,
        Command::DisableUser { username } => set_user_active(&pool, &username, false).await,
        Command::Serve => {
            let port = resolve_port(args.port).context("Invalid port configuration")?;
            serve(pool, port).await
        }
    }
}

async fn set_user_active(pool: &sqlx::SqlitePool, username: &str, active: bool) -> Result<()> {
    let username = username.trim();
    let credentials = users::find_credentials(pool, username)
        .await
        .with_context(|| format!("Failed to look up user '{}'", username))?
        .with_context(|| format!("No such user '{}'", username))?;

    users::set_active(pool, credentials.user.id, Some(active))
        .await
        .with_context(|| format!("Failed to update user '{}'", username))?;
    info!(
        "User '{}' (id {}) is now {}",
        username,
        credentials.user.id,
        if active { "active" } else { "disabled" }
    );
    Ok(())
}

async fn serve(pool: sqlx::SqlitePool, port: u16) -> Result<()> {
    let app = build_router(AppState::new(pool));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("stats-admin listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
