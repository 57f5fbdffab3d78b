//! Record-stream HTTP server.

use metrics_exporter_prometheus::PrometheusHandle;
use record_stream_runtime::metrics;
use record_stream_server::{build_app, config::Config};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "record_stream=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting record-stream server");

    let config = Config::from_env();
    info!(
        address = %config.server.bind_address(),
        catalog_size = config.catalog_size,
        lanes = config.pipeline.lanes.get(),
        tick_interval = ?config.pipeline.tick_interval,
        max_delay = ?config.pipeline.max_delay,
        metrics_enabled = config.metrics_enabled,
        "Configuration loaded"
    );

    let metrics: Option<PrometheusHandle> = if config.metrics_enabled {
        Some(metrics::install_prometheus()?)
    } else {
        None
    };

    let app = build_app(&config, metrics);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Open SSE streams never end on their own, so shutdown is bounded.
    let shutdown = Arc::new(Notify::new());
    let trigger = Arc::clone(&shutdown);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            trigger.notify_one();
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        () = async {
            shutdown.notified().await;
            tokio::time::sleep(config.server.shutdown_timeout).await;
        } => {
            warn!(
                timeout = ?config.server.shutdown_timeout,
                "Shutdown timeout elapsed, closing remaining connections"
            );
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
