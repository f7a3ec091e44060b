//! OrganLink Coordination Server (organlink-cs) - Main entry point
//!
//! Serves the registration, approval, matching, dashboard and SSE APIs
//! over the shared organlink.db.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use organlink_common::api::auth::load_shared_secret;
use organlink_common::config::{RootFolderInitializer, RootFolderResolver};
use organlink_common::db::init::init_database;
use organlink_common::events::EventBus;
use organlink_cs::{build_router, AppState};

/// Command-line arguments for organlink-cs
#[derive(Parser, Debug)]
#[command(name = "organlink-cs")]
#[command(about = "Coordination Server for OrganLink")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "6710", env = "ORGANLINK_PORT")]
    port: u16,

    /// Root folder holding organlink.db (overrides env/config resolution)
    #[arg(short, long, env = "ORGANLINK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "organlink_cs=info,organlink_common=info,tower_http=info".into()
            }),
        )
        .init();

    // Log build identification immediately, before database delays
    info!(
        "Starting OrganLink Coordination Server (organlink-cs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // CLI arg wins; otherwise the 4-tier resolution (env > config > default)
    let root_folder = match args.root_folder {
        Some(path) => path,
        None => RootFolderResolver::new("coordination-server").resolve(),
    };

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database initialized");

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load shared secret")?;
    if shared_secret == 0 {
        warn!("API authentication disabled (api_shared_secret = 0)");
    } else {
        info!("✓ Loaded shared secret for admin API authentication");
    }

    let event_bus = EventBus::new(100);
    let state = AppState::new(pool, event_bus, shared_secret);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("organlink-cs listening on http://{}", addr);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
