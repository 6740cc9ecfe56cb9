use std::path::Path;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::document::{Document, Meta};
use crate::error::BoardError;
use crate::ingest::Pipeline;
use crate::resolve::RoleCandidates;
use crate::rules::PresentationRules;
use crate::view::Leaderboard;

/// Name of the multipart field carrying the spreadsheet.
pub const UPLOAD_FIELD: &str = "file";

// room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub roles: Arc<RoleCandidates>,
    pub rules: Arc<PresentationRules>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, roles: RoleCandidates, rules: PresentationRules) -> Self {
        Self { pipeline, roles: Arc::new(roles), rules: Arc::new(rules) }
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub meta: Meta,
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = match &self {
            BoardError::Validation(_) => StatusCode::BAD_REQUEST,
            BoardError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BoardError::NotReady => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let msg = self.to_string();
        if self.is_client_error() {
            info!(%msg, code = %status.as_u16(), "request refused");
        } else {
            warn!(%msg, code = %status.as_u16(), "request failed");
        }
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn router(state: AppState, client_dist: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.pipeline.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD);
    let mut router = Router::new()
        .route("/api/health", get(health))
        .route("/api/meta", get(meta))
        .route("/api/data", get(data))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/upload", post(upload).layer(DefaultBodyLimit::max(body_limit)))
        .with_state(state);
    if let Some(dist) = client_dist.filter(|d| d.is_dir()) {
        info!(dist = %dist.display(), "serving dashboard bundle");
        let spa = ServeDir::new(dist).not_found_service(ServeFile::new(dist.join("index.html")));
        router = router.fallback_service(spa);
    }
    router.layer(cors)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn meta(State(state): State<AppState>) -> Result<Json<Meta>, BoardError> {
    let document = state.pipeline.current().await?;
    Ok(Json(document.meta.clone()))
}

async fn data(State(state): State<AppState>) -> Result<Json<Document>, BoardError> {
    let document = state.pipeline.current().await?;
    Ok(Json(Document::clone(&document)))
}

async fn leaderboard(State(state): State<AppState>) -> Result<Json<Leaderboard>, BoardError> {
    let document = state.pipeline.current().await?;
    Ok(Json(Leaderboard::build(&document, &state.roles, &state.rules)))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, BoardError> {
    let limit = state.pipeline.max_upload_bytes();
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        let document = state.pipeline.ingest_bytes(&file_name, bytes.to_vec()).await?;
        return Ok(Json(UploadResponse { ok: true, meta: document.meta.clone() }));
    }
    Err(BoardError::Validation(format!("missing file field '{UPLOAD_FIELD}'")))
}

fn multipart_error(e: MultipartError, limit: usize) -> BoardError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BoardError::TooLarge { limit }
    } else {
        BoardError::Validation(e.body_text())
    }
}
