//! Local viewer
//!
//! Serves a directory (the exported reports and the dashboard page) on the
//! loopback interface until the process is interrupted.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use axum::Router;
use clap::Args;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct ViewerConfig {
    #[clap(short, long, env = "INGESTION_VIEWER_PORT", default_value_t = 8000)]
    pub port: u16,
    /// Directory to serve.
    #[clap(long, env = "INGESTION_VIEWER_ROOT", default_value = ".")]
    pub root: PathBuf,
    /// Page opened in the browser on startup.
    #[clap(long, env = "INGESTION_VIEWER_LANDING", default_value = "index.html")]
    pub landing: String,
    #[clap(long = "no-browser", action = clap::ArgAction::SetFalse)]
    pub open_browser: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

pub fn router(root: impl Into<PathBuf>) -> Router {
    Router::new().fallback_service(ServeDir::new(root.into()))
}

pub async fn bind(port: u16) -> Result<TcpListener, Error> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })
}

/// Serve `config.root` on `listener` until `shutdown` resolves.
pub async fn serve_on(
    listener: TcpListener,
    config: &ViewerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Error> {
    let addr = listener.local_addr().map_err(Error::Serve)?;
    let landing = format!(
        "http://localhost:{}/{}",
        addr.port(),
        config.landing.trim_start_matches('/')
    );
    info!(%addr, root = %config.root.display(), "serving files");
    info!(url = %landing, "dashboard available");
    if config.open_browser {
        if let Err(error) = open::that_detached(&landing) {
            warn!(%error, url = %landing, "failed to open browser");
        }
    }
    axum::serve(listener, router(&config.root))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::Serve)?;
    info!("server stopped");
    Ok(())
}

pub async fn serve(config: &ViewerConfig) -> Result<(), Error> {
    let listener = bind(config.port).await?;
    serve_on(listener, config, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for interrupt");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
