//! HTTP surface: the export and analyze endpoints on axum.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;

use crate::chat::ChatProxy;
use crate::config::Config;
use crate::error::Error;
use crate::export::{self, ExportResponse};
use crate::pdf::RenderOptions;

/// Read-only state shared by all requests.
#[derive(Clone)]
struct AppState {
    render: Arc<RenderOptions>,
    chat: Arc<ChatProxy>,
}

pub fn router(config: &Config) -> Result<Router, Error> {
    let state = AppState {
        render: Arc::new(config.render_options()),
        chat: Arc::new(config.chat_proxy()?),
    };
    Ok(Router::new()
        .route("/api/generate-pdf", post(generate_pdf))
        .route("/api/analyze", post(analyze))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .with_state(state))
}

pub async fn serve(config: Config) -> Result<(), Error> {
    let app = router(&config)?;
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

async fn healthz() -> &'static str {
    "ok"
}

async fn generate_pdf(State(state): State<AppState>, body: Bytes) -> Response {
    let options = Arc::clone(&state.render);
    match tokio::task::spawn_blocking(move || export::handle(&body, &options)).await {
        Ok(response) => into_http(response),
        Err(e) => {
            log::error!("PDF generation task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "PDF generation failed" })),
            )
                .into_response()
        }
    }
}

async fn analyze(State(state): State<AppState>, body: Bytes) -> Response {
    let response = state.chat.handle(&body).await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

fn into_http(export: ExportResponse) -> Response {
    let status = StatusCode::from_u16(export.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, export.body).into_response();
    let headers = response.headers_mut();
    for (name, value) in export.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => log::warn!("dropping unrepresentable header {name}"),
        }
    }
    response
}
