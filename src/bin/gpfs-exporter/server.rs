use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use gpfs_exporter::{Commands, Config};

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Serves the metrics until the process is terminated. Every request runs a
/// fresh collection cycle.
pub async fn serve(addr: SocketAddr, config: Config) -> Result<()> {
    let app = Router::new()
        .route("/", get(metrics))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(Arc::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(%addr, "listening");

    axum::serve(listener, app)
        .await
        .with_context(|| "serving HTTP")
}

async fn metrics(State(config): State<Arc<Config>>) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let backend = Commands::new(Config::clone(&config));
        gpfs_exporter::scrape(&backend, &config)
    })
    .await;

    match result {
        Ok(Ok(prom)) => {
            ([(header::CONTENT_TYPE, CONTENT_TYPE)], prom).into_response()
        }
        Ok(Err(e)) => {
            error!(error = %format_args!("{e:#}"), "collection failed");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("collection failed: {e:#}\n"),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "collection panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok\n"
}
