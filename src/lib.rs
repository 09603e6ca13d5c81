//! kallm - semantic caching proxy for Chat-Completions-style APIs.
//!
//! kallm sits between OpenAI-compatible clients and their upstream
//! provider, embeds each chat request, and answers from an in-memory
//! similarity cache when a previous response is close enough. On a miss
//! the request is forwarded upstream and the response admitted for
//! future hits.

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub mod cache;
pub mod config;
pub mod embedding;
pub mod error;
pub mod reports;
pub mod routes;
pub mod state;
pub mod types;
pub mod vector;

pub use config::Config;
pub use state::AppState;

/// Build the application router over shared state.
///
/// Exposed separately from [`run_server`] so tests can drive the full
/// route table against stub collaborators.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/stats", get(routes::stats))
        .route("/reports", get(routes::dashboard))
        .route("/reports/", get(routes::dashboard))
        .route("/reports/data", get(routes::report_data))
        .route("/reports/logs", get(routes::logs))
        .route("/reports/logs/clear", get(routes::clear_logs))
        .route("/v1/chat/completions", post(routes::chat_completions))
        .fallback(routes::fallback)
        .with_state(state)
        // Layer order: the last layer added is the outermost, so panic
        // recovery wraps logging wraps CORS.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(|_: Box<dyn std::any::Any + Send>| {
            error!("handler panicked");
            crate::error::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            )
        }))
}

/// Run the proxy server until interrupted.
///
/// Binds the configured address, serves the router with graceful
/// shutdown on SIGINT/SIGTERM, then quiesces the cache sweeper and logs
/// final statistics.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let embedder = embedding::from_config(&config);
    let state = Arc::new(AppState::new(config.clone(), embedder));

    info!(
        max_size = config.max_cache_size,
        ttl_secs = config.cache_ttl.as_secs(),
        threshold = config.similarity_threshold,
        "initialized cache"
    );

    let app = router(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("server listening on http://{addr}");
    info!("OpenAI API: http://{addr}/v1/chat/completions");
    info!("Dashboard:  http://{addr}/reports");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    state.cache.shutdown();

    let stats = state.cache.stats().await;
    info!(
        total_entries = stats.total_entries,
        total_hits = stats.total_hits,
        total_misses = stats.total_misses,
        hit_rate = %format!("{:.2}%", stats.hit_rate * 100.0),
        estimated_saved_usd = %format!("${:.4}", stats.estimated_saved_usd),
        "final cache stats"
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_router_builds() {
        let config = Config::default();
        // Router construction must not require a live embedder.
        let embedder = embedding::from_config(&config);
        let state = Arc::new(AppState::new(config, embedder));
        let _ = router(state);
    }
}
