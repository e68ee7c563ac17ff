use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thermoscan_api::config::ServerConfig;
use thermoscan_api::router::build_app_router;
use thermoscan_api::state::AppState;
use thermoscan_pipeline::{load_analysis_config, ReportAggregator};
use thermoscan_store::FsCaptureStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thermoscan_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let analysis = load_analysis_config(config.analysis_config.as_deref())
        .unwrap_or_else(|e| panic!("Invalid analysis configuration: {e}"));

    // --- Capture store ---
    let store = FsCaptureStore::new(
        config.images_dir.clone(),
        config.images_base_url.clone(),
        analysis.skin_range,
    );
    tracing::info!(root = %store.root().display(), "Capture store ready");

    // --- Aggregator ---
    let mut aggregator = ReportAggregator::new(Arc::new(store), analysis)
        .unwrap_or_else(|e| panic!("Invalid analysis configuration: {e}"));
    if let Some(concurrency) = config.analysis_concurrency {
        aggregator = aggregator.with_concurrency(concurrency);
    }
    tracing::info!(
        views = aggregator.config().views.len(),
        concurrency = aggregator.concurrency(),
        "Report aggregator ready"
    );

    // --- App state ---
    let state = AppState { aggregator };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
