//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use super::{handlers, models::ErrorResponse, models::SummarizeRequest};
use crate::config::Config;
use crate::error::SummaryError;
use crate::pipeline::SummaryPipeline;
use crate::storage::JobStorage;

/// Largest accepted upload body
const UPLOAD_LIMIT_BYTES: usize = 1024 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SummaryPipeline>,
    pub storage: Arc<JobStorage>,
    pub config: Arc<Config>,
}

/// Build the router with all routes and middleware
pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .route("/summarize", post(summarize_handler))
        .route("/summaries/:filename", get(download_handler))
        .route("/config", get(config_handler))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(app_state: AppState, port: u16) -> Result<()> {
    app_state.storage.ensure_folders_exist().await?;

    let address = format!("{}:{}", app_state.config.server.host, port);
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 API server listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// HTTP status for a failed request
pub fn status_for(error: &SummaryError) -> StatusCode {
    match error {
        SummaryError::InvalidRequest(_) | SummaryError::Format(_) => StatusCode::BAD_REQUEST,
        SummaryError::NotFound(_) => StatusCode::NOT_FOUND,
        SummaryError::NothingImportant(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: SummaryError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        error!("❌ Request failed: {}", error);
    } else {
        warn!("Request rejected ({}): {}", status, error);
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    let form = match handlers::read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) => return error_response(e),
    };

    match handlers::upload(&state.storage, form).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn summarize_handler(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> impl IntoResponse {
    match handlers::summarize(&state.pipeline, &state.storage, request).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn download_handler(State(state): State<AppState>, Path(filename): Path<String>) -> impl IntoResponse {
    match handlers::download(&state.storage, &filename).await {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "video/mp4")], bytes).into_response(),
        Err(e) => error_response(e),
    }
}

async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::config_info(&state.config)))
}
