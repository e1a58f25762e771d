use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::task::{self, JoinError};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, warn};

use crate::{
    config::GalleryConfig,
    error::GalleryError,
    gallery::Gallery,
    view::{render_page, RestResponse, WindowView},
};

#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
}

#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    #[serde(rename = "FirstRow")]
    pub first_row: i64,
}

/// Decodes a `{"FirstRow": n}` body. Rows above the top clamp to row 0.
pub fn parse_window_request(body: &[u8]) -> Result<usize, GalleryError> {
    let request: WindowRequest = serde_json::from_slice(body)?;
    Ok(usize::try_from(request.first_row.max(0)).unwrap_or(usize::MAX))
}

pub fn status_for(err: &GalleryError) -> StatusCode {
    match err {
        GalleryError::RequestDecode(_) => StatusCode::BAD_REQUEST,
        GalleryError::WindowTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug)]
pub enum ApiError {
    Gallery(GalleryError),
    Join(JoinError),
}

impl From<GalleryError> for ApiError {
    fn from(err: GalleryError) -> Self {
        ApiError::Gallery(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Join(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Gallery(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    warn!("gallery request failed: {err}");
                }
                if err.is_retryable() {
                    (status, [(header::RETRY_AFTER, "1")], err.to_string()).into_response()
                } else {
                    (status, err.to_string()).into_response()
                }
            }
            ApiError::Join(err) => {
                error!("window task failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub fn router(state: AppState, config: &GalleryConfig) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/gallery") }))
        .route("/healthz", get(healthz))
        .route("/gallery", get(gallery_page))
        .route("/restGallery", post(rest_gallery))
        .nest_service("/assets", ServeDir::new(&config.assets_dir))
        .nest_service("/imgs", ServeDir::new(&config.root))
        .nest_service("/thumbs", ServeDir::new(&config.thumb_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

/// Runs the blocking window request on tokio's blocking pool.
async fn window(state: &AppState, first_row: usize) -> Result<WindowView, ApiError> {
    let gallery = Arc::clone(&state.gallery);
    let view = task::spawn_blocking(move || gallery.request_window(first_row)).await??;
    Ok(view)
}

async fn gallery_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let view = window(&state, 0).await?;
    Ok(Html(render_page(&view)))
}

async fn rest_gallery(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RestResponse>, ApiError> {
    let first_row = parse_window_request(&body)?;
    let view = window(&state, first_row).await?;
    Ok(Json(RestResponse::from(&view)))
}
