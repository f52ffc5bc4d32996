//! pdf2zh Server
//!
//! HTTP relay in front of an external PDF translator.

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pdf2zh_server::{routes, AppState, Config};

const DEFAULT_LOG_FILTER: &str = "pdf2zh_server=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    dotenvy::dotenv().ok();

    // Invalid variables stop startup; there is no fallback to defaults
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Refusing to start: {}", e);
            return Err(e).context("Invalid configuration");
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        command = %config.translator.command,
        args = %config.translator.args.join(" "),
        timeout = ?config.translator.timeout,
        staging = %config.upload.staging_dir().display(),
        allow_list = config.upload.allowed_params.is_some(),
        "pdf2zh relay configured"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = routes::router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Relay stopped");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing")
}

/// Resolves on Ctrl+C, or SIGTERM on unix; in-flight translations then finish
async fn shutdown_signal() {
    #[cfg(unix)]
    let reason = {
        use signal::unix::{signal as unix_signal, SignalKind};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = signal::ctrl_c() => "Ctrl+C",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable, Ctrl+C only: {}", e);
                let _ = signal::ctrl_c().await;
                "Ctrl+C"
            }
        }
    };

    #[cfg(not(unix))]
    let reason = {
        let _ = signal::ctrl_c().await;
        "Ctrl+C"
    };

    tracing::info!("Received {}, draining in-flight translations", reason);
}
