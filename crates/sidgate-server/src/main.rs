//! sidgate server.
//!
//! Run with: cargo run -p sidgate-server -- sidgate.conf

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::Router;
use clap::Parser;
use sidgate_core::UserDirectory;
use sidgate_oauth::GoogleAuthenticator;
use sidgate_session::SessionRegistry;
use sidgate_transport::{AppState, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::{Listen, Settings};

#[derive(Debug, Parser)]
#[command(version, about = "Cookie-session web front end authenticated with Google OAuth")]
struct Cli {
    /// Configuration file.
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!(config = %cli.config.display(), "Loading configuration");
    let settings = Settings::load(&cli.config)?;
    tracing::debug!(
        datastore = %settings.base_dir,
        data_dir = %settings.data_dir.display(),
        "Datastore ready"
    );

    let registry = SessionRegistry::spawn();
    let state = AppState {
        sessions: registry.handle(),
        authenticator: Arc::new(GoogleAuthenticator::new(settings.google.clone())),
        users: UserDirectory::new(&settings.user_dir),
    };
    let app = create_router(state);

    match &settings.listen {
        Listen::Tcp(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!("Server listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Listen::Unix(path) => serve_unix(path, app).await?,
    }

    registry.shutdown().await?;
    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(unix)]
async fn serve_unix(path: &std::path::Path, app: Router) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    // A socket left by a previous run makes bind fail.
    let _ = std::fs::remove_file(path);
    let listener = tokio::net::UnixListener::bind(path)
        .with_context(|| format!("failed to bind {}", path.display()))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666))
        .with_context(|| format!("failed to chmod {}", path.display()))?;

    tracing::info!(socket = %path.display(), "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(not(unix))]
async fn serve_unix(path: &std::path::Path, _app: Router) -> anyhow::Result<()> {
    anyhow::bail!("{}: unix sockets are not supported on this platform", path.display())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
